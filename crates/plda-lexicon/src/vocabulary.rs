//! Vocabulary index: a bijection between word strings and dense ids.

use std::collections::HashMap;
use std::path::Path;

use plda_types::WordId;
use tracing::{debug, info};

use crate::error::LexiconError;

/// Immutable word <-> id mapping.
///
/// Ids are assigned sequentially in first-seen order, starting at zero.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: Vec<String>,
    ids: HashMap<String, WordId>,
}

impl Vocabulary {
    /// Build from word-list files read in order.
    ///
    /// Each file is split on whitespace. A word's first occurrence assigns the
    /// next id; later occurrences, in the same or a later file, are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `MissingResource` if any file cannot be read.
    pub fn from_word_lists<P: AsRef<Path>>(paths: &[P]) -> Result<Self, LexiconError> {
        let mut vocabulary = Self::default();

        for path in paths {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .map_err(|e| LexiconError::missing(path, e))?;

            let before = vocabulary.len();
            for word in content.split_whitespace() {
                vocabulary.insert(word);
            }
            debug!(
                path = %path.display(),
                new_words = vocabulary.len() - before,
                "Read word list"
            );
        }

        info!(
            words = vocabulary.len(),
            files = paths.len(),
            "Loaded vocabulary"
        );
        Ok(vocabulary)
    }

    /// Build from an in-memory word sequence.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Self::default();
        for word in words {
            vocabulary.insert(word.as_ref());
        }
        vocabulary
    }

    fn insert(&mut self, word: &str) -> WordId {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.words.len() as WordId;
        self.words.push(word.to_string());
        self.ids.insert(word.to_string(), id);
        id
    }

    /// Id of `word`, or `None` if it is not part of the vocabulary.
    pub fn id_of(&self, word: &str) -> Option<WordId> {
        self.ids.get(word).copied()
    }

    pub fn word_of(&self, id: WordId) -> Option<&str> {
        self.words.get(id as usize).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.ids.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words in id order.
    pub fn iter(&self) -> impl Iterator<Item = (WordId, &str)> {
        self.words
            .iter()
            .enumerate()
            .map(|(id, word)| (id as WordId, word.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_words_assigns_sequential_ids() {
        let vocab = Vocabulary::from_words(["rust", "python", "rust", "go"]);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id_of("rust"), Some(0));
        assert_eq!(vocab.id_of("python"), Some(1));
        assert_eq!(vocab.id_of("go"), Some(2));
        assert_eq!(vocab.word_of(2), Some("go"));
    }

    #[test]
    fn test_lookup_missing() {
        let vocab = Vocabulary::from_words(["a"]);
        assert_eq!(vocab.id_of("b"), None);
        assert_eq!(vocab.word_of(7), None);
        assert!(!vocab.contains("b"));
    }

    #[test]
    fn test_bijection() {
        let vocab = Vocabulary::from_words(["x", "y", "z"]);
        for (id, word) in vocab.iter() {
            assert_eq!(vocab.id_of(word), Some(id));
            assert_eq!(vocab.word_of(id), Some(word));
        }
    }

    #[test]
    fn test_from_word_lists_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");
        std::fs::write(&first, "good bad\nexcellent\n").unwrap();
        std::fs::write(&second, "bad  terrible\tgood fine").unwrap();

        let vocab = Vocabulary::from_word_lists(&[&first, &second]).unwrap();
        let words: Vec<&str> = vocab.iter().map(|(_, w)| w).collect();
        assert_eq!(words, vec!["good", "bad", "excellent", "terrible", "fine"]);
    }

    #[test]
    fn test_missing_word_list() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent.txt");

        let result = Vocabulary::from_word_lists(&[&missing]);
        match result {
            Err(LexiconError::MissingResource { path, .. }) => assert_eq!(path, missing),
            other => panic!("Expected MissingResource, got {:?}", other),
        }
    }

    #[test]
    fn test_empty() {
        let vocab = Vocabulary::from_words(Vec::<String>::new());
        assert!(vocab.is_empty());
    }
}

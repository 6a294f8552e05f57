//! Corpus loading.
//!
//! A [`CorpusAdapter`] supplies raw documents as token strings. [`Corpus`]
//! maps them to vocabulary ids, dropping out-of-vocabulary tokens, and holds
//! optional per-document topic labels.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plda_lexicon::Vocabulary;
use plda_types::{TopicIndex, WordId};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::error::SamplerError;

/// Source of tokenized documents.
pub trait CorpusAdapter {
    /// Ids of every document, in the order they should be sampled.
    fn document_ids(&self) -> Result<Vec<String>, SamplerError>;

    /// Tokens of one document.
    fn read_document(&self, id: &str) -> Result<Vec<String>, SamplerError>;
}

/// Lowercase and split on anything that is not alphanumeric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Documents held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    documents: Vec<(String, Vec<String>)>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pre-tokenized document.
    pub fn push_tokens<I, S>(&mut self, id: impl Into<String>, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.documents
            .push((id.into(), tokens.into_iter().map(Into::into).collect()));
    }

    /// Add a raw text document, tokenized with [`tokenize`].
    pub fn push_text(&mut self, id: impl Into<String>, text: &str) {
        self.documents.push((id.into(), tokenize(text)));
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl CorpusAdapter for InMemoryCorpus {
    fn document_ids(&self) -> Result<Vec<String>, SamplerError> {
        Ok(self.documents.iter().map(|(id, _)| id.clone()).collect())
    }

    fn read_document(&self, id: &str) -> Result<Vec<String>, SamplerError> {
        self.documents
            .iter()
            .find(|(doc_id, _)| doc_id == id)
            .map(|(_, tokens)| tokens.clone())
            .ok_or_else(|| SamplerError::InvalidArgument(format!("unknown document {:?}", id)))
    }
}

/// One document per regular file below a root directory.
///
/// Document ids are paths relative to the root, sorted, with `/` separators.
/// Hidden files are skipped.
#[derive(Debug, Clone)]
pub struct DirectoryCorpus {
    root: PathBuf,
}

impl DirectoryCorpus {
    /// # Errors
    ///
    /// `MissingResource` if `root` is not a readable directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SamplerError> {
        let root = root.into();
        let metadata = fs::metadata(&root).map_err(|e| SamplerError::missing(&root, e))?;
        if !metadata.is_dir() {
            return Err(SamplerError::missing(
                &root,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CorpusAdapter for DirectoryCorpus {
    fn document_ids(&self) -> Result<Vec<String>, SamplerError> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                let id: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                ids.push(id.join("/"));
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read_document(&self, id: &str) -> Result<Vec<String>, SamplerError> {
        let path = self.root.join(id);
        let bytes = fs::read(&path).map_err(|e| SamplerError::missing(&path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = text {
            warn!(doc = %id, "Document is not valid UTF-8, decoding lossily");
        }
        Ok(tokenize(&text))
    }
}

/// A document as the sampler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub tokens: Vec<WordId>,
    /// Allowed topics; `None` allows every topic
    pub labels: Option<Vec<TopicIndex>>,
}

impl Document {
    pub fn new(id: impl Into<String>, tokens: Vec<WordId>) -> Self {
        Self {
            id: id.into(),
            tokens,
            labels: None,
        }
    }

    /// Restrict the document to `labels`; repeated topics count once.
    pub fn with_labels(mut self, labels: Vec<TopicIndex>) -> Self {
        self.labels = Some(distinct(labels));
        self
    }

    pub fn allows(&self, topic: TopicIndex) -> bool {
        self.labels
            .as_ref()
            .map_or(true, |labels| labels.contains(&topic))
    }
}

fn distinct(mut topics: Vec<TopicIndex>) -> Vec<TopicIndex> {
    topics.sort_unstable();
    topics.dedup();
    topics
}

/// Documents mapped to vocabulary ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    documents: Vec<Document>,
    vocab_size: usize,
    dropped_tokens: usize,
}

impl Corpus {
    /// Read every document from `adapter`, keeping only vocabulary words.
    #[instrument(skip(adapter, vocabulary), fields(vocab_size = vocabulary.len()))]
    pub fn from_adapter<A: CorpusAdapter + ?Sized>(
        adapter: &A,
        vocabulary: &Vocabulary,
    ) -> Result<Self, SamplerError> {
        let mut documents = Vec::new();
        let mut dropped_tokens = 0;

        for id in adapter.document_ids()? {
            let mut tokens = Vec::new();
            for token in adapter.read_document(&id)? {
                match vocabulary.id_of(&token) {
                    Some(word) => tokens.push(word),
                    None => dropped_tokens += 1,
                }
            }
            debug!(doc = %id, tokens = tokens.len(), "Loaded document");
            documents.push(Document::new(id, tokens));
        }

        let corpus = Self {
            documents,
            vocab_size: vocabulary.len(),
            dropped_tokens,
        };
        info!(
            documents = corpus.len(),
            tokens = corpus.num_tokens(),
            dropped_tokens,
            "Loaded corpus"
        );
        Ok(corpus)
    }

    /// Build from already-mapped documents.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a token id is outside `0..vocab_size`.
    pub fn from_documents(
        documents: Vec<Document>,
        vocab_size: usize,
    ) -> Result<Self, SamplerError> {
        for doc in &documents {
            if let Some(&word) = doc.tokens.iter().find(|&&w| w as usize >= vocab_size) {
                return Err(SamplerError::InvalidArgument(format!(
                    "document {:?} has word id {} outside vocabulary of {}",
                    doc.id, word, vocab_size
                )));
            }
        }
        Ok(Self {
            documents,
            vocab_size,
            dropped_tokens: 0,
        })
    }

    /// Attach labels by document id. Returns how many documents were labeled.
    pub fn apply_labels(&mut self, labels: &HashMap<String, Vec<TopicIndex>>) -> usize {
        let mut applied = 0;
        for doc in &mut self.documents {
            if let Some(topics) = labels.get(&doc.id) {
                doc.labels = Some(distinct(topics.clone()));
                applied += 1;
            }
        }
        if applied < labels.len() {
            warn!(
                unmatched = labels.len() - applied,
                "Labels reference documents not in the corpus"
            );
        }
        applied
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn num_tokens(&self) -> usize {
        self.documents.iter().map(|d| d.tokens.len()).sum()
    }

    /// Tokens skipped during loading because they were not in the vocabulary.
    pub fn dropped_tokens(&self) -> usize {
        self.dropped_tokens
    }
}

/// Parse a labels file: `doc_id<TAB>t1,t2,...` per line.
///
/// Blank lines and `#` comments are ignored. Any other malformed line is an
/// error naming its line number.
pub fn parse_labels(text: &str) -> Result<HashMap<String, Vec<TopicIndex>>, SamplerError> {
    let mut labels = HashMap::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let malformed = |message: String| {
            SamplerError::InvalidArgument(format!("labels line {}: {}", index + 1, message))
        };

        let (doc, topics) = trimmed
            .split_once('\t')
            .ok_or_else(|| malformed("missing tab after document id".to_string()))?;
        let mut parsed = Vec::new();
        for topic in topics.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let topic: TopicIndex = topic
                .parse()
                .map_err(|_| malformed(format!("invalid topic {:?}", topic)))?;
            if !parsed.contains(&topic) {
                parsed.push(topic);
            }
        }
        if parsed.is_empty() {
            return Err(malformed(format!("document {:?} has no topics", doc)));
        }
        labels.insert(doc.trim().to_string(), parsed);
    }
    Ok(labels)
}

/// Read and parse a labels file.
pub fn read_labels(path: &Path) -> Result<HashMap<String, Vec<TopicIndex>>, SamplerError> {
    let text = fs::read_to_string(path).map_err(|e| SamplerError::missing(path, e))?;
    let labels = parse_labels(&text)?;
    info!(path = %path.display(), documents = labels.len(), "Loaded labels");
    Ok(labels)
}

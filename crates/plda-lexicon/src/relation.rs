//! Relation source parsing.
//!
//! Supported layouts (see [`RelationFormat`]):
//!
//! - `pairs`: `word_a word_b`, exactly two whitespace-separated words per line.
//!   Typical for co-occurrence lists.
//! - `dictionary`: `headword<TAB>entry;entry;...`. Each entry relates to the
//!   headword. Typical for bilingual dictionaries.
//!
//! Blank lines and lines starting with `#` carry no records.

use serde::Serialize;

pub use plda_types::RelationFormat;

/// Per-source counters reported after ingesting a relation file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    /// Word pairs found in well-formed lines
    pub records: usize,
    /// Pairs that became (or strengthened) an edge
    pub edges_added: usize,
    /// Pairs skipped because a word is outside the vocabulary
    pub unknown_words: usize,
    /// Pairs skipped because both sides are the same word
    pub self_references: usize,
    /// Lines skipped as malformed
    pub malformed: usize,
}

impl SourceStats {
    pub(crate) fn merge(&mut self, other: SourceStats) {
        self.records += other.records;
        self.edges_added += other.edges_added;
        self.unknown_words += other.unknown_words;
        self.self_references += other.self_references;
        self.malformed += other.malformed;
    }
}

/// Parse one line into the word pairs it asserts.
///
/// Returns an empty list for blank and comment lines, and an error message
/// for a malformed record.
pub fn parse_line(line: &str, format: RelationFormat) -> Result<Vec<(&str, &str)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(Vec::new());
    }

    match format {
        RelationFormat::Pairs => {
            let mut tokens = trimmed.split_whitespace();
            match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(a), Some(b), None) => Ok(vec![(a, b)]),
                _ => Err(format!(
                    "expected 2 words, found {}",
                    trimmed.split_whitespace().count()
                )),
            }
        }
        RelationFormat::Dictionary => {
            let (head, entries) = trimmed
                .split_once('\t')
                .ok_or_else(|| "missing tab between headword and entries".to_string())?;
            let head = head.trim();
            if head.is_empty() || head.split_whitespace().count() != 1 {
                return Err(format!("headword must be a single word, got {:?}", head));
            }

            let pairs: Vec<(&str, &str)> = entries
                .split(';')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(|entry| (head, entry))
                .collect();
            if pairs.is_empty() {
                return Err(format!("headword {:?} has no entries", head));
            }
            Ok(pairs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_line() {
        let pairs = parse_line("good  great", RelationFormat::Pairs).unwrap();
        assert_eq!(pairs, vec![("good", "great")]);
    }

    #[test]
    fn test_pairs_malformed() {
        assert!(parse_line("lonely", RelationFormat::Pairs).is_err());
        let err = parse_line("one two three", RelationFormat::Pairs).unwrap_err();
        assert!(err.contains("found 3"));
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert!(parse_line("   ", RelationFormat::Pairs).unwrap().is_empty());
        assert!(parse_line("# header", RelationFormat::Dictionary)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_dictionary_line() {
        let pairs = parse_line("gut\tgood; fine ;;nice", RelationFormat::Dictionary).unwrap();
        assert_eq!(pairs, vec![("gut", "good"), ("gut", "fine"), ("gut", "nice")]);
    }

    #[test]
    fn test_dictionary_malformed() {
        assert!(parse_line("gut good", RelationFormat::Dictionary).is_err());
        assert!(parse_line("gut\t ; ", RelationFormat::Dictionary).is_err());
    }

    #[test]
    fn test_stats_merge() {
        let mut total = SourceStats::default();
        total.merge(SourceStats {
            records: 2,
            edges_added: 1,
            unknown_words: 1,
            self_references: 0,
            malformed: 3,
        });
        total.merge(SourceStats {
            records: 1,
            edges_added: 1,
            ..Default::default()
        });
        assert_eq!(total.records, 3);
        assert_eq!(total.edges_added, 2);
        assert_eq!(total.malformed, 3);
    }
}

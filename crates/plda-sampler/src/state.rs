//! Count matrices kept in lockstep with topic assignments.

use plda_types::{TopicIndex, WordId};
use serde::Serialize;

use crate::corpus::Corpus;
use crate::error::SamplerError;

/// Sufficient statistics of the collapsed sampler.
///
/// After every completed token update:
/// `sum_t doc_topic[d][t] == doc_totals[d] == |d|` and
/// `sum_w topic_word[t][w] == topic_totals[t]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountMatrices {
    doc_topic: Vec<Vec<u32>>,
    topic_word: Vec<Vec<u32>>,
    topic_totals: Vec<u32>,
    doc_totals: Vec<u32>,
}

impl CountMatrices {
    pub fn new(num_docs: usize, num_topics: usize, vocab_size: usize) -> Self {
        Self {
            doc_topic: vec![vec![0; num_topics]; num_docs],
            topic_word: vec![vec![0; vocab_size]; num_topics],
            topic_totals: vec![0; num_topics],
            doc_totals: vec![0; num_docs],
        }
    }

    /// Rebuild counts from scratch for a corpus and its assignments.
    pub fn from_assignments(
        corpus: &Corpus,
        num_topics: usize,
        assignments: &[Vec<TopicIndex>],
    ) -> Self {
        let mut counts = Self::new(corpus.len(), num_topics, corpus.vocab_size());
        for (d, (doc, topics)) in corpus.documents().iter().zip(assignments).enumerate() {
            for (&word, &topic) in doc.tokens.iter().zip(topics) {
                counts.assign(d, word, topic);
            }
        }
        counts
    }

    #[inline]
    pub(crate) fn assign(&mut self, doc: usize, word: WordId, topic: TopicIndex) {
        self.doc_topic[doc][topic] += 1;
        self.topic_word[topic][word as usize] += 1;
        self.topic_totals[topic] += 1;
        self.doc_totals[doc] += 1;
    }

    /// Caller guarantees the token is currently counted under `topic`.
    #[inline]
    pub(crate) fn unassign(&mut self, doc: usize, word: WordId, topic: TopicIndex) {
        self.doc_topic[doc][topic] -= 1;
        self.topic_word[topic][word as usize] -= 1;
        self.topic_totals[topic] -= 1;
        self.doc_totals[doc] -= 1;
    }

    pub fn num_docs(&self) -> usize {
        self.doc_topic.len()
    }

    pub fn num_topics(&self) -> usize {
        self.topic_totals.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.topic_word.first().map_or(0, Vec::len)
    }

    #[inline]
    pub fn doc_topic(&self, doc: usize, topic: TopicIndex) -> u32 {
        self.doc_topic[doc][topic]
    }

    #[inline]
    pub fn topic_word(&self, topic: TopicIndex, word: WordId) -> u32 {
        self.topic_word[topic][word as usize]
    }

    #[inline]
    pub fn topic_total(&self, topic: TopicIndex) -> u32 {
        self.topic_totals[topic]
    }

    #[inline]
    pub fn doc_total(&self, doc: usize) -> u32 {
        self.doc_totals[doc]
    }

    pub fn doc_topic_row(&self, doc: usize) -> &[u32] {
        &self.doc_topic[doc]
    }

    /// K rows of V word counts.
    pub fn topic_word_rows(&self) -> &[Vec<u32>] {
        &self.topic_word
    }

    pub fn topic_totals(&self) -> &[u32] {
        &self.topic_totals
    }

    /// Verify the counts against a from-scratch recount.
    pub fn check(
        &self,
        corpus: &Corpus,
        assignments: &[Vec<TopicIndex>],
    ) -> Result<(), SamplerError> {
        let fail = |message: String| Err(SamplerError::InvalidState(message));

        if assignments.len() != corpus.len() || self.num_docs() != corpus.len() {
            return fail(format!(
                "{} documents, {} assignment rows, {} count rows",
                corpus.len(),
                assignments.len(),
                self.num_docs()
            ));
        }
        let k = self.num_topics();
        for (doc, topics) in corpus.documents().iter().zip(assignments) {
            if doc.tokens.len() != topics.len() {
                return fail(format!(
                    "document {:?} has {} tokens but {} assignments",
                    doc.id,
                    doc.tokens.len(),
                    topics.len()
                ));
            }
            if let Some(&topic) = topics.iter().find(|&&t| t >= k || !doc.allows(t)) {
                return fail(format!(
                    "document {:?} has token assigned to disallowed topic {}",
                    doc.id, topic
                ));
            }
        }

        let expected = Self::from_assignments(corpus, k, assignments);
        if &expected != self {
            return fail("count matrices disagree with assignments".to_string());
        }
        for (d, doc) in corpus.documents().iter().enumerate() {
            let row_sum: u32 = self.doc_topic[d].iter().sum();
            if row_sum as usize != doc.tokens.len() {
                return fail(format!(
                    "document {:?} topic counts sum to {}, expected {}",
                    doc.id,
                    row_sum,
                    doc.tokens.len()
                ));
            }
        }
        for (t, row) in self.topic_word.iter().enumerate() {
            let row_sum: u32 = row.iter().sum();
            if row_sum != self.topic_totals[t] {
                return fail(format!(
                    "topic {} word counts sum to {}, total is {}",
                    t, row_sum, self.topic_totals[t]
                ));
            }
        }
        Ok(())
    }
}

//! Dirichlet prior vectors shared by the optimizer and the sampler.
//!
//! Both prior families hold strictly positive, finite pseudo-counts. The
//! constructors enforce this so downstream code never re-checks it.

use serde::{Deserialize, Serialize};

use crate::error::PldaError;

/// Identifier of a vocabulary word.
pub type WordId = u32;

/// Index of a latent topic in `[0, num_topics)`.
pub type TopicIndex = usize;

/// Per-topic asymmetric word priors (beta), one vector per topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPriors {
    vectors: Vec<Vec<f64>>,
    sums: Vec<f64>,
}

impl WordPriors {
    /// Same pseudo-count for every topic and word.
    pub fn symmetric(num_topics: usize, vocab_size: usize, beta: f64) -> Result<Self, PldaError> {
        Self::from_vectors(vec![vec![beta; vocab_size]; num_topics])
    }

    /// Build from explicit per-topic vectors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when there are no topics, the vectors differ in
    /// length, or any component is non-positive or non-finite.
    pub fn from_vectors(vectors: Vec<Vec<f64>>) -> Result<Self, PldaError> {
        let Some(first) = vectors.first() else {
            return Err(PldaError::InvalidInput(
                "word priors need at least one topic".to_string(),
            ));
        };
        let vocab_size = first.len();

        let mut sums = Vec::with_capacity(vectors.len());
        for (topic, vector) in vectors.iter().enumerate() {
            if vector.len() != vocab_size {
                return Err(PldaError::InvalidInput(format!(
                    "topic {} has {} word priors, expected {}",
                    topic,
                    vector.len(),
                    vocab_size
                )));
            }
            if let Some(word) = vector.iter().position(|b| !(b.is_finite() && *b > 0.0)) {
                return Err(PldaError::InvalidInput(format!(
                    "word prior for topic {} word {} must be positive and finite, got {}",
                    topic, word, vector[word]
                )));
            }
            sums.push(vector.iter().sum());
        }

        Ok(Self { vectors, sums })
    }

    pub fn num_topics(&self) -> usize {
        self.vectors.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vectors.first().map_or(0, Vec::len)
    }

    /// Pseudo-count for `word` under `topic`.
    #[inline]
    pub fn get(&self, topic: TopicIndex, word: WordId) -> f64 {
        self.vectors[topic][word as usize]
    }

    /// Sum of all pseudo-counts of `topic`.
    #[inline]
    pub fn sum(&self, topic: TopicIndex) -> f64 {
        self.sums[topic]
    }

    pub fn topic(&self, topic: TopicIndex) -> &[f64] {
        &self.vectors[topic]
    }

    pub fn into_vectors(self) -> Vec<Vec<f64>> {
        self.vectors
    }
}

/// Document-topic prior (alpha), possibly asymmetric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicPriors {
    alpha: Vec<f64>,
    sum: f64,
}

impl TopicPriors {
    pub fn symmetric(num_topics: usize, alpha: f64) -> Result<Self, PldaError> {
        Self::from_vec(vec![alpha; num_topics])
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty vector or a non-positive entry.
    pub fn from_vec(alpha: Vec<f64>) -> Result<Self, PldaError> {
        if alpha.is_empty() {
            return Err(PldaError::InvalidInput(
                "topic priors need at least one topic".to_string(),
            ));
        }
        if let Some(topic) = alpha.iter().position(|a| !(a.is_finite() && *a > 0.0)) {
            return Err(PldaError::InvalidInput(format!(
                "topic prior {} must be positive and finite, got {}",
                topic, alpha[topic]
            )));
        }
        let sum = alpha.iter().sum();
        Ok(Self { alpha, sum })
    }

    pub fn num_topics(&self) -> usize {
        self.alpha.len()
    }

    #[inline]
    pub fn get(&self, topic: TopicIndex) -> f64 {
        self.alpha[topic]
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_word_priors() {
        let priors = WordPriors::symmetric(3, 4, 0.5).unwrap();
        assert_eq!(priors.num_topics(), 3);
        assert_eq!(priors.vocab_size(), 4);
        assert!((priors.get(2, 3) - 0.5).abs() < f64::EPSILON);
        assert!((priors.sum(1) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_word_priors_reject_non_positive() {
        let result = WordPriors::from_vectors(vec![vec![0.1, 0.0]]);
        assert!(matches!(result, Err(PldaError::InvalidInput(_))));

        let result = WordPriors::from_vectors(vec![vec![0.1, f64::NAN]]);
        assert!(matches!(result, Err(PldaError::InvalidInput(_))));
    }

    #[test]
    fn test_word_priors_reject_ragged() {
        let result = WordPriors::from_vectors(vec![vec![0.1, 0.2], vec![0.1]]);
        match result {
            Err(PldaError::InvalidInput(msg)) => assert!(msg.contains("expected 2")),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_word_priors_reject_empty() {
        assert!(WordPriors::from_vectors(Vec::new()).is_err());
    }

    #[test]
    fn test_asymmetric_sums() {
        let priors = WordPriors::from_vectors(vec![vec![1.0, 2.0], vec![0.5, 0.25]]).unwrap();
        assert!((priors.sum(0) - 3.0).abs() < 1e-12);
        assert!((priors.sum(1) - 0.75).abs() < 1e-12);
        assert_eq!(priors.topic(1), &[0.5, 0.25]);
    }

    #[test]
    fn test_topic_priors() {
        let alpha = TopicPriors::symmetric(4, 0.25).unwrap();
        assert_eq!(alpha.num_topics(), 4);
        assert!((alpha.sum() - 1.0).abs() < 1e-12);

        assert!(TopicPriors::from_vec(vec![0.1, -0.1]).is_err());
        assert!(TopicPriors::from_vec(Vec::new()).is_err());
    }

    #[test]
    fn test_priors_serialization() {
        let priors = WordPriors::from_vectors(vec![vec![1.0, 2.0]]).unwrap();
        let json = serde_json::to_string(&priors).unwrap();
        let back: WordPriors = serde_json::from_str(&json).unwrap();
        assert_eq!(priors, back);
    }
}

//! Point estimates from the count matrices.

use plda_types::{TopicPriors, WordId, WordPriors};

use crate::corpus::Corpus;
use crate::state::CountMatrices;

/// theta[d][t] = (n_dt + alpha_t) / (n_d + sum alpha), zero outside a labeled
/// document's allowed topics.
pub fn theta(corpus: &Corpus, counts: &CountMatrices, topic_priors: &TopicPriors) -> Vec<Vec<f64>> {
    corpus
        .documents()
        .iter()
        .enumerate()
        .map(|(d, doc)| {
            let alpha_sum: f64 = match &doc.labels {
                Some(labels) => labels.iter().map(|&t| topic_priors.get(t)).sum(),
                None => topic_priors.sum(),
            };
            let denominator = f64::from(counts.doc_total(d)) + alpha_sum;
            (0..counts.num_topics())
                .map(|t| {
                    if doc.allows(t) {
                        (f64::from(counts.doc_topic(d, t)) + topic_priors.get(t)) / denominator
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

/// phi[t][w] = (n_tw + beta_tw) / (n_t + sum_w beta_tw)
pub fn phi(counts: &CountMatrices, word_priors: &WordPriors) -> Vec<Vec<f64>> {
    counts
        .topic_word_rows()
        .iter()
        .enumerate()
        .map(|(t, row)| {
            let beta = word_priors.topic(t);
            let denominator = f64::from(counts.topic_total(t)) + word_priors.sum(t);
            row.iter()
                .zip(beta)
                .map(|(&n, &b)| (f64::from(n) + b) / denominator)
                .collect()
        })
        .collect()
}

/// The `n` most probable words of each topic, best first. Ties go to the
/// lower word id.
pub fn top_words(phi: &[Vec<f64>], n: usize) -> Vec<Vec<(WordId, f64)>> {
    phi.iter()
        .map(|row| {
            let mut ranked: Vec<(WordId, f64)> = row
                .iter()
                .enumerate()
                .map(|(w, &p)| (w as WordId, p))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            ranked.truncate(n);
            ranked
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;

    fn fixture() -> (Corpus, CountMatrices) {
        let corpus = Corpus::from_documents(
            vec![
                Document::new("a", vec![0, 0, 1]),
                Document::new("b", vec![2]).with_labels(vec![1]),
            ],
            3,
        )
        .unwrap();
        let counts = CountMatrices::from_assignments(&corpus, 2, &[vec![0, 0, 1], vec![1]]);
        (corpus, counts)
    }

    #[test]
    fn test_theta_rows_sum_to_one() {
        let (corpus, counts) = fixture();
        let alpha = TopicPriors::symmetric(2, 0.5).unwrap();
        let theta = theta(&corpus, &counts, &alpha);

        assert!((theta[0][0] - 2.5 / 4.0).abs() < 1e-12);
        assert!((theta[0][1] - 1.5 / 4.0).abs() < 1e-12);
        // Labeled document: all mass on its topic
        assert_eq!(theta[1][0], 0.0);
        assert!((theta[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_theta_with_repeated_label() {
        let corpus =
            Corpus::from_documents(vec![Document::new("a", vec![0, 1]).with_labels(vec![1, 1])], 2)
                .unwrap();
        let counts = CountMatrices::from_assignments(&corpus, 2, &[vec![1, 1]]);
        let alpha = TopicPriors::symmetric(2, 1.0).unwrap();

        let theta = theta(&corpus, &counts, &alpha);
        assert_eq!(theta[0][0], 0.0);
        assert!((theta[0].iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_phi_rows_sum_to_one() {
        let (_, counts) = fixture();
        let beta = WordPriors::symmetric(2, 3, 0.1).unwrap();
        let phi = phi(&counts, &beta);

        for row in &phi {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
        assert!((phi[0][0] - 2.1 / 2.3).abs() < 1e-12);
    }

    #[test]
    fn test_top_words_order() {
        let phi = vec![vec![0.2, 0.5, 0.2, 0.1]];
        let top = top_words(&phi, 3);
        assert_eq!(top[0].iter().map(|(w, _)| *w).collect::<Vec<_>>(), vec![1, 0, 2]);

        assert_eq!(top_words(&phi, 10)[0].len(), 4);
    }
}

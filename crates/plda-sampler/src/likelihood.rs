//! Collapsed joint log-likelihood `log p(w, z)`.

use plda_types::{TopicPriors, WordPriors};

use crate::corpus::Corpus;
use crate::state::CountMatrices;

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function for `x > 0` (Lanczos approximation).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection: Gamma(x) Gamma(1 - x) = pi / sin(pi x)
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = LANCZOS_COEFFICIENTS[0];
    for (i, &c) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }
    let t = x + LANCZOS_G + 0.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + sum.ln()
}

/// Collapsed log-likelihood of the corpus under the current counts.
///
/// Labeled documents use a Dirichlet restricted to their allowed topics.
pub fn log_likelihood(
    corpus: &Corpus,
    counts: &CountMatrices,
    topic_priors: &TopicPriors,
    word_priors: &WordPriors,
) -> f64 {
    let mut total = 0.0;

    for topic in 0..counts.num_topics() {
        let beta = word_priors.topic(topic);
        let beta_sum = word_priors.sum(topic);
        total += ln_gamma(beta_sum) - ln_gamma(f64::from(counts.topic_total(topic)) + beta_sum);
        for (word, &n) in counts.topic_word_rows()[topic].iter().enumerate() {
            if n > 0 {
                total += ln_gamma(f64::from(n) + beta[word]) - ln_gamma(beta[word]);
            }
        }
    }

    for (d, doc) in corpus.documents().iter().enumerate() {
        let alpha_sum: f64 = match &doc.labels {
            Some(labels) => labels.iter().map(|&t| topic_priors.get(t)).sum(),
            None => topic_priors.sum(),
        };
        total += ln_gamma(alpha_sum) - ln_gamma(f64::from(counts.doc_total(d)) + alpha_sum);
        for (topic, &n) in counts.doc_topic_row(d).iter().enumerate() {
            if n > 0 {
                let alpha = topic_priors.get(topic);
                total += ln_gamma(f64::from(n) + alpha) - ln_gamma(alpha);
            }
        }
    }

    total
}

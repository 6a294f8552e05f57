//! Fit asymmetric topic-word priors over the similarity graph.
//!
//! Anchors come from the sampler's topic-word counts: `ln(n_tw + base_beta)`,
//! raised by `ln(seed_boost)` for seed words of a topic. The optimizer then
//! trades closeness to the anchors against smoothness across graph edges, and
//! the optimum is exponentiated back into pseudo-counts.

use plda_lexicon::{SimilarityGraph, Vocabulary};
use plda_types::{PriorSettings, WordId, WordPriors};
use tracing::{info, instrument, warn};

use crate::config::LbfgsConfig;
use crate::error::PriorError;
use crate::lbfgs::{LbfgsOptimizer, Optimized};
use crate::objective::Objective;
use crate::ridge::RidgeObjective;
use crate::smoothness::GraphSmoothnessObjective;

/// Fitted priors together with the optimizer outcome that produced them.
#[derive(Debug, Clone)]
pub struct FittedPriors {
    pub priors: WordPriors,
    pub outcome: Optimized,
}

/// Turns topic-word counts into graph-smoothed [`WordPriors`].
pub struct PriorFitter<'g> {
    graph: &'g SimilarityGraph,
    settings: PriorSettings,
    optimizer: LbfgsOptimizer,
}

impl<'g> PriorFitter<'g> {
    pub fn new(graph: &'g SimilarityGraph, settings: PriorSettings) -> Result<Self, PriorError> {
        settings.validate().map_err(PriorError::InvalidArgument)?;
        let optimizer = LbfgsOptimizer::new(LbfgsConfig::from(&settings))?;
        Ok(Self {
            graph,
            settings,
            optimizer,
        })
    }

    pub fn settings(&self) -> &PriorSettings {
        &self.settings
    }

    /// Topic-major anchor vector for `counts` (K rows of V counts).
    ///
    /// `seeds[t]` lists the seed words of topic `t`; topics past the end of
    /// `seeds` have none.
    pub fn anchor(
        &self,
        counts: &[Vec<u32>],
        seeds: &[Vec<WordId>],
    ) -> Result<Vec<f64>, PriorError> {
        let v = self.graph.num_vertices();
        if counts.is_empty() {
            return Err(PriorError::InvalidArgument(
                "count matrix has no topics".to_string(),
            ));
        }
        if seeds.len() > counts.len() {
            return Err(PriorError::InvalidArgument(format!(
                "{} seed lists for {} topics",
                seeds.len(),
                counts.len()
            )));
        }

        let mut anchor = Vec::with_capacity(counts.len() * v);
        for (topic, row) in counts.iter().enumerate() {
            if row.len() != v {
                return Err(PriorError::InvalidArgument(format!(
                    "topic {} has {} word counts, graph has {} vertices",
                    topic,
                    row.len(),
                    v
                )));
            }
            anchor.extend(
                row.iter()
                    .map(|&n| (f64::from(n) + self.settings.base_beta).ln()),
            );
        }

        let boost = self.settings.seed_boost.ln();
        for (topic, words) in seeds.iter().enumerate() {
            for &word in words {
                if word as usize >= v {
                    return Err(PriorError::InvalidArgument(format!(
                        "seed word {} out of range for {} words",
                        word, v
                    )));
                }
                anchor[topic * v + word as usize] += boost;
            }
        }

        Ok(anchor)
    }

    /// Fit priors for the given counts and seeds.
    #[instrument(skip(self, counts, seeds), fields(topics = counts.len()))]
    pub fn fit(
        &self,
        counts: &[Vec<u32>],
        seeds: &[Vec<WordId>],
    ) -> Result<FittedPriors, PriorError> {
        let anchor = self.anchor(counts, seeds)?;
        let initial = anchor.clone();
        let smoothness = GraphSmoothnessObjective::new(
            self.graph,
            counts.len(),
            anchor,
            self.settings.smoothness_weight,
            self.settings.anchor_weight,
        )?;

        let outcome = if self.settings.ridge > 0.0 {
            let ridge = RidgeObjective::new(smoothness, self.settings.ridge)?;
            self.run(&ridge, initial)?
        } else {
            self.run(&smoothness, initial)?
        };

        let v = self.graph.num_vertices().max(1);
        let vectors: Vec<Vec<f64>> = outcome
            .vars
            .chunks(v)
            .map(|topic| topic.iter().map(|x| x.exp().max(f64::MIN_POSITIVE)).collect())
            .collect();
        let priors = WordPriors::from_vectors(vectors)?;

        info!(
            topics = priors.num_topics(),
            words = priors.vocab_size(),
            iterations = outcome.iterations,
            reason = %outcome.reason,
            "Fitted word priors"
        );
        Ok(FittedPriors { priors, outcome })
    }

    fn run<O: Objective>(&self, objective: &O, initial: Vec<f64>) -> Result<Optimized, PriorError> {
        self.optimizer.optimize(objective, initial)
    }
}

/// Map per-topic seed word strings to ids, skipping (and logging) unknown words.
pub fn resolve_seed_words(vocabulary: &Vocabulary, lists: &[Vec<String>]) -> Vec<Vec<WordId>> {
    lists
        .iter()
        .enumerate()
        .map(|(topic, words)| {
            words
                .iter()
                .filter_map(|word| {
                    let id = vocabulary.id_of(word);
                    if id.is_none() {
                        warn!(topic, word = %word, "Seed word not in vocabulary");
                    }
                    id
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plda_lexicon::GraphBuilder;

    /// a - b, c isolated
    fn fixture() -> (Vocabulary, SimilarityGraph) {
        let vocab = Vocabulary::from_words(["a", "b", "c"]);
        let mut builder = GraphBuilder::new(&vocab);
        builder.add_word_pair("a", "b");
        let graph = builder.build();
        (vocab, graph)
    }

    fn settings() -> PriorSettings {
        PriorSettings {
            gradient_tolerance: 1e-9,
            max_iterations: 500,
            ..PriorSettings::default()
        }
    }

    #[test]
    fn test_anchor_values() {
        let (_, graph) = fixture();
        let fitter = PriorFitter::new(&graph, settings()).unwrap();

        let anchor = fitter.anchor(&[vec![10, 0, 3]], &[vec![2]]).unwrap();
        assert_eq!(anchor.len(), 3);
        assert!((anchor[0] - 10.01f64.ln()).abs() < 1e-12);
        assert!((anchor[1] - 0.01f64.ln()).abs() < 1e-12);
        assert!((anchor[2] - (3.01f64.ln() + 5.0f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_anchor_shape_checked() {
        let (_, graph) = fixture();
        let fitter = PriorFitter::new(&graph, settings()).unwrap();

        assert!(fitter.anchor(&[], &[]).is_err());
        assert!(fitter.anchor(&[vec![1, 2]], &[]).is_err());
        assert!(fitter.anchor(&[vec![1, 2, 3]], &[vec![7]]).is_err());
        assert!(fitter.anchor(&[vec![1, 2, 3]], &[vec![], vec![]]).is_err());
    }

    #[test]
    fn test_smoothing_lifts_graph_neighbor() {
        let (_, graph) = fixture();
        let fitter = PriorFitter::new(&graph, settings()).unwrap();

        let fitted = fitter.fit(&[vec![10, 0, 0]], &[]).unwrap();
        let priors = &fitted.priors;

        // b borrows mass from its neighbor a; c has no neighbors
        assert!(priors.get(0, 1) > 0.05, "b prior {}", priors.get(0, 1));
        assert!(priors.get(0, 0) < 10.01);
        assert!((priors.get(0, 2) - 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_seed_boost_applies() {
        let (_, graph) = fixture();
        let fitter = PriorFitter::new(&graph, settings()).unwrap();

        let fitted = fitter.fit(&[vec![0, 0, 0], vec![0, 0, 0]], &[vec![2]]).unwrap();
        assert_eq!(fitted.priors.num_topics(), 2);
        assert!((fitted.priors.get(0, 2) - 0.05).abs() < 1e-3);
        assert!((fitted.priors.get(1, 2) - 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_ridge_shrinks_toward_unit_prior() {
        let (_, graph) = fixture();
        let plain = PriorFitter::new(&graph, settings())
            .unwrap()
            .fit(&[vec![0, 0, 0]], &[])
            .unwrap();
        let ridged = PriorFitter::new(
            &graph,
            PriorSettings {
                ridge: 1.0,
                ..settings()
            },
        )
        .unwrap()
        .fit(&[vec![0, 0, 0]], &[])
        .unwrap();

        // ln-priors pulled toward zero, so the pseudo-count grows toward 1
        assert!(ridged.priors.get(0, 2) > plain.priors.get(0, 2));
        assert!(ridged.priors.get(0, 2) < 1.0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let (_, graph) = fixture();
        let result = PriorFitter::new(
            &graph,
            PriorSettings {
                base_beta: 0.0,
                ..settings()
            },
        );
        assert!(matches!(result, Err(PriorError::InvalidArgument(_))));
    }

    #[test]
    fn test_resolve_seed_words_skips_unknown() {
        let (vocab, _) = fixture();
        let seeds = resolve_seed_words(
            &vocab,
            &[
                vec!["c".to_string(), "zzz".to_string()],
                vec!["a".to_string()],
            ],
        );
        assert_eq!(seeds, vec![vec![2], vec![0]]);
    }
}

//! Graph-smoothness objective over per-topic log-priors.
//!
//! Variables are laid out topic-major: `x[t * V + w]` is the log pseudo-count
//! of word `w` under topic `t`.
//!
//! ```text
//! f(x) = lambda * sum_t sum_{(a,b) in E} w_ab (x_ta - x_tb)^2
//!      + mu     * sum_t sum_w (x_tw - anchor_tw)^2
//! ```
//!
//! Both the value and the gradient walk per-vertex adjacency, so evaluation
//! costs O(K * (V + E)).

use plda_lexicon::SimilarityGraph;

use crate::error::PriorError;
use crate::objective::{check_dimension, Objective};

/// Smoothness over similarity-graph edges plus a quadratic pull to an anchor.
#[derive(Debug, Clone)]
pub struct GraphSmoothnessObjective<'g> {
    graph: &'g SimilarityGraph,
    num_topics: usize,
    anchor: Vec<f64>,
    smoothness_weight: f64,
    anchor_weight: f64,
}

impl<'g> GraphSmoothnessObjective<'g> {
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `anchor` is not `num_topics * V` long or a
    /// weight is negative.
    pub fn new(
        graph: &'g SimilarityGraph,
        num_topics: usize,
        anchor: Vec<f64>,
        smoothness_weight: f64,
        anchor_weight: f64,
    ) -> Result<Self, PriorError> {
        let expected = num_topics * graph.num_vertices();
        if anchor.len() != expected {
            return Err(PriorError::InvalidArgument(format!(
                "anchor has {} entries, expected {} ({} topics x {} words)",
                anchor.len(),
                expected,
                num_topics,
                graph.num_vertices()
            )));
        }
        if smoothness_weight < 0.0 || anchor_weight < 0.0 {
            return Err(PriorError::InvalidArgument(
                "objective weights must be >= 0".to_string(),
            ));
        }

        Ok(Self {
            graph,
            num_topics,
            anchor,
            smoothness_weight,
            anchor_weight,
        })
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn anchor(&self) -> &[f64] {
        &self.anchor
    }
}

impl Objective for GraphSmoothnessObjective<'_> {
    fn num_variables(&self) -> usize {
        self.anchor.len()
    }

    fn value(&self, vars: &[f64]) -> Result<f64, PriorError> {
        check_dimension(self.num_variables(), vars)?;
        let v = self.graph.num_vertices();

        let mut smooth = 0.0;
        for topic in vars.chunks_exact(v.max(1)).take(self.num_topics) {
            for a in 0..v {
                for (b, weight) in self.graph.neighbors(a as u32) {
                    // Each undirected edge once
                    if (b as usize) > a {
                        let diff = topic[a] - topic[b as usize];
                        smooth += f64::from(weight) * diff * diff;
                    }
                }
            }
        }

        let anchored: f64 = vars
            .iter()
            .zip(&self.anchor)
            .map(|(x, a)| (x - a) * (x - a))
            .sum();

        Ok(self.smoothness_weight * smooth + self.anchor_weight * anchored)
    }

    fn gradient(&self, vars: &[f64]) -> Result<Vec<f64>, PriorError> {
        check_dimension(self.num_variables(), vars)?;
        let v = self.graph.num_vertices();
        let mut grad = vec![0.0; vars.len()];

        for t in 0..self.num_topics {
            let base = t * v;
            for a in 0..v {
                let x_a = vars[base + a];
                let pull: f64 = self
                    .graph
                    .neighbors(a as u32)
                    .map(|(b, weight)| f64::from(weight) * (x_a - vars[base + b as usize]))
                    .sum();
                grad[base + a] = 2.0 * self.smoothness_weight * pull
                    + 2.0 * self.anchor_weight * (x_a - self.anchor[base + a]);
            }
        }

        Ok(grad)
    }
}

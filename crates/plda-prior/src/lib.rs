//! # plda-prior
//!
//! Asymmetric Dirichlet prior fitting over a word-similarity graph.
//!
//! ## Features
//! - `Objective` trait for value + gradient providers
//! - Graph-smoothness objective with an anchor pull, optional ridge wrapper
//! - L-BFGS optimizer with backtracking line search and stop reasons
//! - `PriorFitter`: topic-word counts and seed words in, `WordPriors` out

pub mod config;
pub mod error;
pub mod fit;
pub mod lbfgs;
pub mod objective;
pub mod ridge;
pub mod smoothness;

pub use config::LbfgsConfig;
pub use error::PriorError;
pub use fit::{resolve_seed_words, FittedPriors, PriorFitter};
pub use lbfgs::{LbfgsOptimizer, Optimized, StopReason};
pub use objective::{check_dimension, Objective};
pub use ridge::RidgeObjective;
pub use smoothness::GraphSmoothnessObjective;

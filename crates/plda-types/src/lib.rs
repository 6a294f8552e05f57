//! # plda-types
//!
//! Shared types for the graph-regularized topic model.
//!
//! - Word and topic identifiers
//! - Dirichlet prior vectors (`WordPriors`, `TopicPriors`)
//! - Layered `Settings` for every pipeline stage

pub mod config;
pub mod error;
pub mod priors;

pub use config::{
    expand_home, GraphSettings, PlateauCriterion, PriorSettings, RelationFormat,
    RelationSourceSettings, SamplerSettings, Settings, VocabularySettings,
};
pub use error::PldaError;
pub use priors::{TopicIndex, TopicPriors, WordId, WordPriors};

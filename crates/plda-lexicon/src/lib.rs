//! # plda-lexicon
//!
//! Lexical resources for graph-regularized topic modeling.
//!
//! ## Features
//! - Vocabulary index built from ordered word-list files
//! - Relation sources (co-occurrence pairs, bilingual dictionaries)
//! - Weighted, undirected word-similarity graph with increment-on-repeat edges
//! - Exact text round-trip of the graph file

pub mod codec;
pub mod error;
pub mod graph;
pub mod relation;
pub mod vocabulary;

pub use codec::{deserialize, read_graph, serialize, write_graph};
pub use error::LexiconError;
pub use graph::{GraphBuilder, GraphStats, RelationOutcome, SimilarityGraph};
pub use relation::{RelationFormat, SourceStats};
pub use vocabulary::Vocabulary;

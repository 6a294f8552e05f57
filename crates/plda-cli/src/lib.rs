//! `plda` command-line library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (build-graph, inspect-graph, train)

pub mod cli;
pub mod commands;

pub use cli::{BuildGraphArgs, Cli, Commands, TrainArgs};
pub use commands::{
    build_graph, init_logging, inspect_graph, load_settings, load_vocabulary, run_training, train,
    DocumentTopics, TopicSummary, TrainReport, WordWeight,
};

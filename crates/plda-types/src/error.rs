//! Error types shared by the topic-model crates.

use thiserror::Error;

/// Errors raised while loading settings or validating shared model types.
#[derive(Debug, Error)]
pub enum PldaError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

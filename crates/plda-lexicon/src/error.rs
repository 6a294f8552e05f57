//! Lexicon error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building the vocabulary or the similarity graph.
#[derive(Debug, Error)]
pub enum LexiconError {
    /// A required input file could not be opened or read
    #[error("Missing resource {path:?}: {source}")]
    MissingResource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed graph file line (1-based)
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LexiconError {
    pub(crate) fn missing(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LexiconError::MissingResource {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        LexiconError::Parse {
            line,
            message: message.into(),
        }
    }
}

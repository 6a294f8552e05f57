//! Sampler error types.

use std::path::{Path, PathBuf};

use plda_types::PldaError;
use thiserror::Error;

/// Errors that can occur while loading a corpus or sampling.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// Caller supplied inconsistent input (bad weights, dimension mismatch)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A corpus document or labels file could not be read
    #[error("Missing resource {}: {source}", path.display())]
    MissingResource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation not allowed in the current sampler phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Corpus directory traversal error
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Prior vectors rejected by the model
    #[error("Prior model error: {0}")]
    Model(#[from] PldaError),
}

impl SamplerError {
    pub(crate) fn missing(path: &Path, source: std::io::Error) -> Self {
        SamplerError::MissingResource {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SamplerError::InvalidState("sampler has no corpus".to_string());
        assert_eq!(err.to_string(), "Invalid state: sampler has no corpus");

        let err = SamplerError::missing(
            Path::new("/tmp/doc.txt"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "Missing resource /tmp/doc.txt: gone");
    }
}

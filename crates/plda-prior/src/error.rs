//! Prior fitting error types.

use plda_types::PldaError;
use thiserror::Error;

/// Errors that can occur while fitting priors.
#[derive(Debug, Error)]
pub enum PriorError {
    /// Caller supplied inconsistent input (dimension mismatch, bad settings)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Fitted vectors rejected by the prior model
    #[error("Prior model error: {0}")]
    Model(#[from] PldaError),
}

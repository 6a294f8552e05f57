//! # plda-sampler
//!
//! Collapsed Gibbs sampling for (partially) labeled LDA.
//!
//! ## Features
//! - Allocation-free categorical draw over unnormalized weights
//! - Corpus adapters (in-memory, one-file-per-document directories) and labels
//! - Count matrices with recount-based invariant checks
//! - Sweep-count and plateau convergence policies with explicit reasons
//! - Cancellation between sweeps through a shared `StopHandle`
//! - Collapsed log-likelihood, theta/phi estimates and top words

pub mod categorical;
pub mod convergence;
pub mod corpus;
pub mod error;
pub mod estimate;
pub mod likelihood;
pub mod sampler;
pub mod state;

pub use convergence::{ConvergencePolicy, RunReport, SweepRecord, TerminationReason};
pub use corpus::{
    parse_labels, read_labels, tokenize, Corpus, CorpusAdapter, DirectoryCorpus, Document,
    InMemoryCorpus,
};
pub use error::SamplerError;
pub use likelihood::ln_gamma;
pub use sampler::{GibbsSampler, SamplerPhase, StopHandle};
pub use state::CountMatrices;

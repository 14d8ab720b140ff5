//! Fatal batch-level errors.
//!
//! Per-group failures never surface here; they are recorded as `Failed`
//! outcomes by the orchestrator.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    /// The proposal document is not an object or a list of entries.
    #[error("invalid proposal input: {0}")]
    InvalidInput(String),

    /// Normalization left no usable proposals.
    #[error("no commits found in input")]
    EmptyBatch,
}

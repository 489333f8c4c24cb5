//! Error types for subnetx-explain.

use thiserror::Error;

/// Explanation-layer error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Structure-layer error.
    #[error(transparent)]
    Core(#[from] subnetx_core::Error),

    /// Classifier-layer error.
    #[error(transparent)]
    Gnn(#[from] subnetx_gnn::Error),

    /// Artifact I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Explanation requested over an empty sample set.
    #[error("no samples to explain")]
    EmptyDataset,

    /// Aggregation requested with zero runs.
    #[error("n_runs must be >= 1")]
    NoRuns,

    /// Vector length mismatch.
    #[error("length mismatch: expected {expected}, got {got}")]
    Shape { expected: usize, got: usize },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

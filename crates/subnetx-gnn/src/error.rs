//! Error types for subnetx-gnn.

use thiserror::Error;

/// GNN layer error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Structure-layer error.
    #[error(transparent)]
    Core(#[from] subnetx_core::Error),

    /// Forward pass invoked on an empty batch.
    #[error("empty graph batch")]
    EmptyBatch,

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

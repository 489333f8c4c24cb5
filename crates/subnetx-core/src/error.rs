//! Error types for subnetx-core.

use thiserror::Error;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure reading or writing an interchange file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line in an interchange file could not be parsed.
    #[error("parse error in {path} line {line}: {msg}")]
    Parse {
        path: String,
        line: usize,
        msg: String,
    },

    /// Shape mismatch between related structures.
    #[error("shape mismatch: expected {expected}, got {got}")]
    Shape { expected: usize, got: usize },

    /// Dataset has no graphs.
    #[error("dataset is empty")]
    EmptyDataset,

    /// Invalid configuration or input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

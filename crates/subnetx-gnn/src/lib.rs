#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]

//! Graph neural network layer for subnetx.
//!
//! Classifiers over a fixed PPI structure, built on candle:
//!
//! - [`GcnClassifier`] - two-layer graph convolution (Kipf & Welling, 2017)
//! - [`ChebClassifier`] - Chebyshev spectral convolution (Defferrard et al., 2016)
//! - [`MaskedForward`] - the masked-forward seam the explainer works through
//! - [`train_gcn`] / [`train_cheb`] - balanced-split training with early stopping
//!
//! All operators are dense; disease PPI networks are small enough that
//! dense N x N matmuls on CPU outperform sparse scatter kernels.

mod error;
pub mod masked;
pub mod models;
pub mod ops;
pub mod train;

pub use error::{Error, Result};
pub use masked::{DatasetBatch, MaskedForward};
pub use models::{ChebClassifier, GcnClassifier};
pub use train::{train_cheb, train_gcn, TrainConfig, TrainOutcome};

// Re-export candle for downstream tensor work
pub use candle_core;
pub use candle_nn;

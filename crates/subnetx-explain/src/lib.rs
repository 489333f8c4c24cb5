#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::uninlined_format_args)]

//! Explanation layer for subnetx.
//!
//! Given a trained classifier, this crate answers the question the
//! toolkit exists for: which genes and interactions drive the model's
//! predictions, and which connected subnetworks do they form?
//!
//! - [`Explainer`] - single-run perturbation explanation (Ying et al., 2019)
//! - [`aggregate_explanations`] - seeded multi-run averaging with artifacts
//! - [`edge_importance::calc_edge_importance`] - node-to-edge projection
//! - [`detect_communities`] - greedy modularity over the weighted PPI graph
//! - [`explain_with_communities`] - the end-to-end pipeline
//!
//! The classifier is reached only through the
//! [`MaskedForward`](subnetx_gnn::MaskedForward) seam, so any model
//! that implements it can be explained.

pub mod aggregate;
pub mod community;
pub mod edge_importance;
mod error;
pub mod explainer;
pub mod mask;
pub mod pipeline;

pub use aggregate::{aggregate_explanations, AggregateConfig, Explanation};
pub use community::{detect_communities, find_communities, Module};
pub use error::{Error, Result};
pub use explainer::{ExplainConfig, Explainer};
pub use mask::MaskParams;
pub use pipeline::explain_with_communities;

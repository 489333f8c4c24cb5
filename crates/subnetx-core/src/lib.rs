#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::uninlined_format_args)]

//! Structure layer for subnetx.
//!
//! This crate owns the graph-shaped data the rest of the workspace works
//! on:
//!
//! - [`EdgeIndex`] - directed edge list of an undirected PPI network
//! - [`OmicsGraph`] - one sample's node feature matrix plus class label
//! - [`OmicsDataset`] - all samples over one shared PPI structure
//! - [`dataset::load_omics_dataset`] - multi-omics file loading
//! - [`connectivity`] - connected-component checks for the PPI graph
//! - [`io`] - the plain-text interchange formats (masks, communities)
//!
//! # Example
//!
//! ```rust
//! use subnetx_core::{EdgeIndex, OmicsGraph, OmicsDataset};
//!
//! let edges = EdgeIndex::from_pairs(vec![(0, 1), (1, 0)]).unwrap();
//! let sample = OmicsGraph::new(vec![0.3, 0.7], 2, 1, 0).unwrap();
//! let ds = OmicsDataset::new(vec![sample], edges, vec!["TP53".into(), "MDM2".into()]).unwrap();
//!
//! assert_eq!(ds.num_nodes(), 2);
//! ```

pub mod connectivity;
pub mod dataset;
mod error;
mod graph;
pub mod io;

pub use dataset::{load_omics_dataset, LoadConfig};
pub use error::{Error, Result};
pub use graph::{EdgeIndex, OmicsDataset, OmicsGraph};

// Re-export petgraph for advanced graph operations
pub use petgraph;

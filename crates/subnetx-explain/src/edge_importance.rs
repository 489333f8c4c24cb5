//! Node-to-edge importance projection.

use crate::{Error, Result};
use subnetx_core::EdgeIndex;

/// Project per-gene mask weights onto the edge list.
///
/// Each directed edge scores the mean of its two endpoint weights, in
/// edge-list order. Works on raw (pre-sigmoid) weights; callers apply
/// the sigmoid after projection, matching the node-mask transform.
pub fn calc_edge_importance(node_mask: &[f32], edge_index: &EdgeIndex) -> Result<Vec<f32>> {
    if node_mask.len() != edge_index.num_nodes() {
        return Err(Error::Shape {
            expected: edge_index.num_nodes(),
            got: node_mask.len(),
        });
    }
    Ok(edge_index
        .pairs()
        .iter()
        .map(|&(s, t)| (node_mask[s as usize] + node_mask[t as usize]) / 2.0)
        .collect())
}

//! Importance-weighted community detection.
//!
//! Greedy modularity maximization (Clauset-Newman-Moore) over the PPI
//! graph with the aggregated edge mask as edge weights. The resulting
//! communities are the candidate disease subnetworks; each one is
//! scored by the mean importance of its internal edges.
//!
//! Merge order is made deterministic by scanning candidate pairs in
//! ascending order and taking the first pair with the strictly largest
//! modularity gain.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use subnetx_core::{io, EdgeIndex};
use tracing::debug;

/// One detected community with its importance score.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Member node indices, ascending.
    pub nodes: Vec<u32>,
    /// Mean weight of internal edges; 0.0 when there are none.
    pub importance: f32,
}

/// Canonical undirected weighted edges.
///
/// Directed duplicates collapse to `(min, max)` with their weights
/// averaged, so a symmetric directed mask and a one-sided one weight
/// the same undirected edge identically.
fn undirected_weighted(edge_index: &EdgeIndex, edge_mask: &[f32]) -> Vec<((u32, u32), f64)> {
    let mut acc: BTreeMap<(u32, u32), (f64, usize)> = BTreeMap::new();
    for (&(s, t), &w) in edge_index.pairs().iter().zip(edge_mask) {
        let key = (s.min(t), s.max(t));
        let entry = acc.entry(key).or_insert((0.0, 0));
        entry.0 += f64::from(w);
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

/// Detect communities by greedy modularity over mask-weighted edges.
///
/// Starts from singletons and merges the pair with the largest positive
/// modularity gain until no merge improves modularity. Every node of
/// the graph appears in exactly one returned community; communities and
/// their members are in ascending node order.
pub fn detect_communities(edge_index: &EdgeIndex, edge_mask: &[f32]) -> Result<Vec<Module>> {
    if edge_mask.len() != edge_index.num_edges() {
        return Err(Error::Shape {
            expected: edge_index.num_edges(),
            got: edge_mask.len(),
        });
    }
    let n = edge_index.num_nodes();
    let edges = undirected_weighted(edge_index, edge_mask);
    let m: f64 = edges.iter().map(|&(_, w)| w).sum();

    // Community id is the smallest member node, so ascending-key scans
    // stay stable across merges.
    let mut member_of: Vec<u32> = (0..n as u32).collect();
    let mut degree: BTreeMap<u32, f64> = (0..n as u32).map(|i| (i, 0.0)).collect();
    let mut between: BTreeMap<(u32, u32), f64> = BTreeMap::new();
    for &((a, b), w) in &edges {
        *degree.entry(a).or_insert(0.0) += w;
        *degree.entry(b).or_insert(0.0) += w;
        if a != b {
            *between.entry((a, b)).or_insert(0.0) += w;
        }
    }

    if m > 0.0 {
        loop {
            let mut best: Option<((u32, u32), f64)> = None;
            for (&pair, &w_ab) in &between {
                let gain = w_ab / m - degree[&pair.0] * degree[&pair.1] / (2.0 * m * m);
                if best.map_or(true, |(_, g)| gain > g) {
                    best = Some((pair, gain));
                }
            }
            let Some(((a, b), gain)) = best else { break };
            if gain <= 0.0 {
                break;
            }
            debug!(a, b, gain, "merging communities");

            for c in member_of.iter_mut() {
                if *c == b {
                    *c = a;
                }
            }
            let d_b = degree.remove(&b).unwrap_or(0.0);
            *degree.entry(a).or_insert(0.0) += d_b;

            // Rewire b's between-community weights onto a.
            let moved: Vec<((u32, u32), f64)> = between
                .iter()
                .filter(|(&(x, y), _)| x == b || y == b)
                .map(|(&k, &v)| (k, v))
                .collect();
            for ((x, y), w) in moved {
                between.remove(&(x, y));
                let other = if x == b { y } else { x };
                if other != a {
                    *between
                        .entry((other.min(a), other.max(a)))
                        .or_insert(0.0) += w;
                }
            }
        }
    }

    // Collect memberships and score each community by its mean internal
    // edge weight.
    let mut groups: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (node, &com) in member_of.iter().enumerate() {
        groups.entry(com).or_default().push(node as u32);
    }
    let mut internal: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for &((a, b), w) in &edges {
        if member_of[a as usize] == member_of[b as usize] {
            let entry = internal.entry(member_of[a as usize]).or_insert((0.0, 0));
            entry.0 += w;
            entry.1 += 1;
        }
    }

    let modules = groups
        .into_iter()
        .map(|(com, nodes)| {
            let importance = match internal.get(&com) {
                Some(&(sum, count)) if count > 0 => (sum / count as f64) as f32,
                _ => 0.0,
            };
            Module { nodes, importance }
        })
        .collect();
    Ok(modules)
}

/// File-based entry point: read `edge_index.txt` and `edge_masks.txt`,
/// detect communities, and return `(scores, memberships)` aligned by
/// position.
pub fn find_communities(
    edge_index_path: impl AsRef<Path>,
    edge_mask_path: impl AsRef<Path>,
) -> Result<(Vec<f32>, Vec<Vec<u32>>)> {
    let edge_index = EdgeIndex::read_file(edge_index_path)?;
    let edge_mask = io::read_scores(edge_mask_path)?;
    let modules = detect_communities(&edge_index, &edge_mask)?;

    let scores = modules.iter().map(|m| m.importance).collect();
    let memberships = modules.into_iter().map(|m| m.nodes).collect();
    Ok((scores, memberships))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directed(pairs: &[(u32, u32)]) -> EdgeIndex {
        let mut both = Vec::new();
        for &(a, b) in pairs {
            both.push((a, b));
            both.push((b, a));
        }
        EdgeIndex::from_pairs(both).unwrap()
    }

    #[test]
    fn test_uniform_ring_splits_into_adjacent_pairs() {
        // 6-ring with uniform weights: greedy modularity merges the
        // lowest adjacent pair first, then the next, then stops.
        let e = directed(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        let mask = vec![0.5; e.num_edges()];

        let modules = detect_communities(&e, &mask).unwrap();
        let nodes: Vec<Vec<u32>> = modules.iter().map(|m| m.nodes.clone()).collect();
        assert_eq!(nodes, vec![vec![0, 1], vec![2, 3], vec![4, 5]]);
    }

    #[test]
    fn test_two_cliques_with_weak_bridge() {
        // Strong triangles 0-1-2 and 3-4-5 joined by a near-zero bridge.
        let e = directed(&[
            (0, 1),
            (1, 2),
            (0, 2),
            (3, 4),
            (4, 5),
            (3, 5),
            (2, 3),
        ]);
        let mut mask = vec![0.9; e.num_edges()];
        // The bridge (2,3) is the 13th/14th directed edge.
        mask[12] = 0.01;
        mask[13] = 0.01;

        let modules = detect_communities(&e, &mask).unwrap();
        let nodes: Vec<Vec<u32>> = modules.iter().map(|m| m.nodes.clone()).collect();
        assert_eq!(nodes, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn test_every_node_covered_exactly_once() {
        let e = directed(&[(0, 1), (1, 2), (2, 3), (3, 0), (1, 3)]);
        let mask = vec![0.4; e.num_edges()];

        let modules = detect_communities(&e, &mask).unwrap();
        let mut all: Vec<u32> = modules.iter().flat_map(|m| m.nodes.clone()).collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_singleton_scores_zero() {
        // Isolated node 2 stays a singleton with importance 0.
        let e = EdgeIndex::with_num_nodes(vec![(0, 1), (1, 0)], 3).unwrap();
        let modules = detect_communities(&e, &[0.8, 0.8]).unwrap();

        let singleton = modules.iter().find(|m| m.nodes == vec![2]).unwrap();
        assert_eq!(singleton.importance, 0.0);
    }

    #[test]
    fn test_community_score_is_mean_internal_weight() {
        let e = directed(&[(0, 1), (1, 2), (0, 2)]);
        let mask = vec![0.2, 0.2, 0.4, 0.4, 0.6, 0.6];

        let modules = detect_communities(&e, &mask).unwrap();
        assert_eq!(modules.len(), 1);
        assert!((modules[0].importance - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_directed_weights_averaged() {
        // Asymmetric directed weights collapse to their mean.
        let e = EdgeIndex::from_pairs(vec![(0, 1), (1, 0)]).unwrap();
        let modules = detect_communities(&e, &[0.2, 0.6]).unwrap();

        assert_eq!(modules.len(), 1);
        assert!((modules[0].importance - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_mask_length_checked() {
        let e = directed(&[(0, 1)]);
        assert!(detect_communities(&e, &[0.5]).is_err());
    }

    #[test]
    fn test_find_communities_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let ei_path = dir.path().join("edge_index.txt");
        let mask_path = dir.path().join("edge_masks.txt");

        let e = directed(&[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        e.write_file(&ei_path).unwrap();
        io::write_scores(&mask_path, &vec![0.5; e.num_edges()], 5).unwrap();

        let (scores, memberships) = find_communities(&ei_path, &mask_path).unwrap();
        assert_eq!(memberships, vec![vec![0, 1], vec![2, 3], vec![4, 5]]);
        assert_eq!(scores.len(), 3);
        for s in scores {
            assert!((s - 0.5).abs() < 1e-4);
        }
    }
}

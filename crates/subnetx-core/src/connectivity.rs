//! Connectivity checks for the PPI graph.
//!
//! The dataset loader requires a connected interaction graph; if the
//! cutoff-filtered PPI falls apart, training continues on the largest
//! component. Union-Find keeps this O(V + E * alpha(V)).

use crate::EdgeIndex;
use petgraph::unionfind::UnionFind;
use std::collections::HashMap;

fn components(edge_index: &EdgeIndex) -> UnionFind<usize> {
    let n = edge_index.num_nodes();
    let mut uf = UnionFind::new(n);
    for &(s, t) in edge_index.pairs() {
        uf.union(s as usize, t as usize);
    }
    uf
}

/// True when every node is reachable from every other, treating the
/// directed edge list as undirected.
#[must_use]
pub fn is_connected(edge_index: &EdgeIndex) -> bool {
    let n = edge_index.num_nodes();
    if n == 0 {
        return false;
    }
    let mut uf = components(edge_index);
    let root = uf.find_mut(0);
    (1..n).all(|i| uf.find_mut(i) == root)
}

/// Node indices of the largest connected component, ascending.
#[must_use]
pub fn largest_component(edge_index: &EdgeIndex) -> Vec<u32> {
    let n = edge_index.num_nodes();
    let mut uf = components(edge_index);

    let mut groups: HashMap<usize, Vec<u32>> = HashMap::new();
    for i in 0..n {
        let root = uf.find_mut(i);
        groups.entry(root).or_default().push(i as u32);
    }

    groups
        .into_values()
        // Tie on size resolved toward the component containing the
        // smallest node index, so the result is deterministic.
        .max_by(|a, b| a.len().cmp(&b.len()).then(b[0].cmp(&a[0])))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_ring() {
        let e = EdgeIndex::from_pairs(vec![(0, 1), (1, 2), (2, 0)]).unwrap();
        assert!(is_connected(&e));
    }

    #[test]
    fn test_disconnected_pairs() {
        let e = EdgeIndex::from_pairs(vec![(0, 1), (2, 3)]).unwrap();
        assert!(!is_connected(&e));
    }

    #[test]
    fn test_largest_component() {
        // Component {0,1,2} vs component {3,4}
        let e = EdgeIndex::from_pairs(vec![(0, 1), (1, 2), (3, 4)]).unwrap();
        assert_eq!(largest_component(&e), vec![0, 1, 2]);
    }

    #[test]
    fn test_largest_component_tie_prefers_lowest_index() {
        let e = EdgeIndex::from_pairs(vec![(0, 1), (2, 3)]).unwrap();
        assert_eq!(largest_component(&e), vec![0, 1]);
    }

    #[test]
    fn test_isolated_node_breaks_connectivity() {
        let e = EdgeIndex::with_num_nodes(vec![(0, 1)], 3).unwrap();
        assert!(!is_connected(&e));
    }
}

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Edge list of a protein-protein interaction network.
///
/// The PPI graph is undirected but stored in directed form: every
/// interaction (u, v) appears as both (u, v) and (v, u). Edge order is
/// significant — importance vectors produced by the explainer are aligned
/// to it, and the plain-text round-trip (`edge_index.txt`) preserves it.
///
/// # Example
///
/// ```rust
/// use subnetx_core::EdgeIndex;
///
/// let edges = EdgeIndex::from_pairs(vec![(0, 1), (1, 0), (1, 2), (2, 1)]).unwrap();
/// assert_eq!(edges.num_edges(), 4);
/// assert_eq!(edges.num_nodes(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeIndex {
    edges: Vec<(u32, u32)>,
    num_nodes: usize,
}

impl EdgeIndex {
    /// Build an edge index from directed pairs.
    ///
    /// The node count is inferred as `max index + 1`.
    pub fn from_pairs(edges: Vec<(u32, u32)>) -> Result<Self> {
        if edges.is_empty() {
            return Err(Error::InvalidInput("edge list is empty".into()));
        }
        let num_nodes = edges
            .iter()
            .map(|&(s, t)| s.max(t) as usize + 1)
            .max()
            .unwrap_or(0);
        Ok(Self { edges, num_nodes })
    }

    /// Build an edge index with an explicit node count.
    ///
    /// Needed when trailing nodes have no incident edges.
    pub fn with_num_nodes(edges: Vec<(u32, u32)>, num_nodes: usize) -> Result<Self> {
        let index = Self::from_pairs(edges)?;
        if index.num_nodes > num_nodes {
            return Err(Error::InvalidInput(format!(
                "edge references node {} but num_nodes is {}",
                index.num_nodes - 1,
                num_nodes
            )));
        }
        Ok(Self { num_nodes, ..index })
    }

    /// Directed edge pairs in stored order.
    pub fn pairs(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Number of directed edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Write as plain text, one `src,dst` row per directed edge.
    ///
    /// This is the `edge_index.txt` interchange format consumed by the
    /// file-based community detection entry point.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        for &(src, dst) in &self.edges {
            writeln!(w, "{src},{dst}")?;
        }
        Ok(())
    }

    /// Read the `src,dst` plain-text format written by [`write_file`].
    ///
    /// [`write_file`]: EdgeIndex::write_file
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut edges = Vec::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split(',');
            let parse = |s: Option<&str>| -> Result<u32> {
                s.and_then(|v| v.trim().parse().ok()).ok_or(Error::Parse {
                    path: path.display().to_string(),
                    line: lineno + 1,
                    msg: format!("expected `src,dst`, got `{line}`"),
                })
            };
            let src = parse(parts.next())?;
            let dst = parse(parts.next())?;
            edges.push((src, dst));
        }

        Self::from_pairs(edges)
    }

    /// Collapse the directed representation to canonical undirected edges.
    ///
    /// Returns `(min, max)` pairs, deduplicated, in first-seen order.
    pub fn undirected(&self) -> Vec<(u32, u32)> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for &(s, t) in &self.edges {
            let key = (s.min(t), s.max(t));
            if seen.insert(key) {
                out.push(key);
            }
        }
        out
    }
}

/// One omics sample mapped onto the shared PPI graph.
///
/// Node features are stored row-major: `x[n * num_features + f]` is the
/// value of feature (modality) `f` at gene `n`. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmicsGraph {
    x: Vec<f32>,
    num_nodes: usize,
    num_features: usize,
    label: u32,
}

impl OmicsGraph {
    /// Build a graph sample, validating the feature matrix shape.
    pub fn new(x: Vec<f32>, num_nodes: usize, num_features: usize, label: u32) -> Result<Self> {
        if x.len() != num_nodes * num_features {
            return Err(Error::Shape {
                expected: num_nodes * num_features,
                got: x.len(),
            });
        }
        Ok(Self {
            x,
            num_nodes,
            num_features,
            label,
        })
    }

    /// Row-major feature matrix (N x F).
    pub fn features(&self) -> &[f32] {
        &self.x
    }

    /// Feature value at gene `node`, modality `feature`.
    pub fn feature(&self, node: usize, feature: usize) -> f32 {
        self.x[node * self.num_features + feature]
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Class label of this sample.
    pub fn label(&self) -> u32 {
        self.label
    }
}

/// A labeled graph dataset: one PPI structure shared by all samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmicsDataset {
    pub graphs: Vec<OmicsGraph>,
    pub edge_index: EdgeIndex,
    pub gene_names: Vec<String>,
}

impl OmicsDataset {
    /// Assemble a dataset, validating that every sample matches the PPI
    /// node count and the gene-name alignment.
    pub fn new(
        graphs: Vec<OmicsGraph>,
        edge_index: EdgeIndex,
        gene_names: Vec<String>,
    ) -> Result<Self> {
        if graphs.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let n = edge_index.num_nodes();
        if gene_names.len() != n {
            return Err(Error::Shape {
                expected: n,
                got: gene_names.len(),
            });
        }
        for g in &graphs {
            if g.num_nodes() != n {
                return Err(Error::Shape {
                    expected: n,
                    got: g.num_nodes(),
                });
            }
        }
        Ok(Self {
            graphs,
            edge_index,
            gene_names,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.edge_index.num_nodes()
    }

    pub fn num_features(&self) -> usize {
        self.graphs[0].num_features()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Write the aligned gene-name file (one name per line).
    pub fn write_gene_names(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        for name in &self.gene_names {
            writeln!(w, "{name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_index_from_pairs() {
        let e = EdgeIndex::from_pairs(vec![(0, 1), (1, 0), (1, 2), (2, 1)]).unwrap();
        assert_eq!(e.num_nodes(), 3);
        assert_eq!(e.num_edges(), 4);
    }

    #[test]
    fn test_edge_index_empty_rejected() {
        assert!(EdgeIndex::from_pairs(vec![]).is_err());
    }

    #[test]
    fn test_edge_index_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edge_index.txt");

        let e = EdgeIndex::from_pairs(vec![(0, 1), (1, 0), (1, 2), (2, 1)]).unwrap();
        e.write_file(&path).unwrap();
        let back = EdgeIndex::read_file(&path).unwrap();

        assert_eq!(e, back);
    }

    #[test]
    fn test_undirected_dedup() {
        let e = EdgeIndex::from_pairs(vec![(0, 1), (1, 0), (1, 2), (2, 1)]).unwrap();
        assert_eq!(e.undirected(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_graph_shape_checked() {
        assert!(OmicsGraph::new(vec![0.0; 6], 3, 2, 0).is_ok());
        assert!(OmicsGraph::new(vec![0.0; 5], 3, 2, 0).is_err());
    }

    #[test]
    fn test_dataset_alignment_checked() {
        let e = EdgeIndex::from_pairs(vec![(0, 1), (1, 0)]).unwrap();
        let g = OmicsGraph::new(vec![0.0; 2], 2, 1, 0).unwrap();

        // Gene names must match node count.
        assert!(OmicsDataset::new(vec![g.clone()], e.clone(), vec!["A".into()]).is_err());
        assert!(OmicsDataset::new(vec![g], e, vec!["A".into(), "B".into()]).is_ok());
    }
}

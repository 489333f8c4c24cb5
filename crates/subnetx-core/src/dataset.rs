//! Multi-omics dataset loading.
//!
//! Input files:
//!
//! - PPI network: whitespace-separated rows `gene1 gene2 confidence`.
//!   Interactions at or above the confidence cutoff (STRING-style,
//!   default 950) are kept.
//! - One feature file per omics modality: a header row of gene names,
//!   then one whitespace-separated row of values per sample.
//! - Target file: one integer class label per line, aligned to samples.
//!
//! Genes are kept when they appear in the filtered PPI and in every
//! modality. If the induced graph is disconnected, loading restricts to
//! the largest connected component and reindexes.

use crate::connectivity::{is_connected, largest_component};
use crate::{EdgeIndex, Error, OmicsDataset, OmicsGraph, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Loader configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoadConfig {
    /// PPI confidence cutoff; edges below it are dropped.
    pub cutoff: f32,
    /// Min-max normalize each modality to [0, 1].
    pub normalize: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            cutoff: 950.0,
            normalize: true,
        }
    }
}

impl LoadConfig {
    pub fn with_cutoff(mut self, cutoff: f32) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

/// Load a multi-omics graph dataset.
///
/// Returns one [`OmicsGraph`] per sample plus the shared [`EdgeIndex`]
/// and aligned gene names.
pub fn load_omics_dataset(
    ppi_path: impl AsRef<Path>,
    feature_paths: &[impl AsRef<Path>],
    target_path: impl AsRef<Path>,
    config: LoadConfig,
) -> Result<OmicsDataset> {
    if feature_paths.is_empty() {
        return Err(Error::InvalidInput("no feature files given".into()));
    }

    let interactions = read_ppi(ppi_path.as_ref(), config.cutoff)?;
    if interactions.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no PPI interactions at cutoff {}",
            config.cutoff
        )));
    }

    let modalities = feature_paths
        .iter()
        .map(|p| read_modality(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let labels = read_labels(target_path.as_ref())?;

    let num_samples = modalities[0].values.len();
    for m in &modalities {
        if m.values.len() != num_samples {
            return Err(Error::Shape {
                expected: num_samples,
                got: m.values.len(),
            });
        }
    }
    if labels.len() != num_samples {
        return Err(Error::Shape {
            expected: num_samples,
            got: labels.len(),
        });
    }

    // Genes usable everywhere: present in the filtered PPI and in every
    // modality header. Order follows the first modality's header.
    let ppi_genes: HashSet<&str> = interactions
        .iter()
        .flat_map(|(a, b)| [a.as_str(), b.as_str()])
        .collect();
    let mut gene_names: Vec<String> = modalities[0]
        .genes
        .iter()
        .filter(|g| {
            ppi_genes.contains(g.as_str())
                && modalities[1..].iter().all(|m| m.index.contains_key(*g))
        })
        .cloned()
        .collect();
    if gene_names.is_empty() {
        return Err(Error::InvalidInput(
            "no genes shared between PPI and feature files".into(),
        ));
    }

    // Undirected interactions stored in directed form, both orientations.
    let pairs = {
        let gene_index: HashMap<&str, u32> = gene_names
            .iter()
            .enumerate()
            .map(|(i, g)| (g.as_str(), i as u32))
            .collect();
        let mut pairs = Vec::new();
        for (a, b) in &interactions {
            if let (Some(&u), Some(&v)) = (gene_index.get(a.as_str()), gene_index.get(b.as_str()))
            {
                if u != v {
                    pairs.push((u, v));
                    pairs.push((v, u));
                }
            }
        }
        pairs
    };
    let mut edge_index = EdgeIndex::with_num_nodes(pairs, gene_names.len())?;

    if !is_connected(&edge_index) {
        let keep = largest_component(&edge_index);
        info!(
            kept = keep.len(),
            dropped = gene_names.len() - keep.len(),
            "PPI graph disconnected, restricting to largest component"
        );
        let remap: HashMap<u32, u32> = keep
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new as u32))
            .collect();
        let pairs: Vec<(u32, u32)> = edge_index
            .pairs()
            .iter()
            .filter_map(|&(s, t)| Some((*remap.get(&s)?, *remap.get(&t)?)))
            .collect();
        gene_names = keep.iter().map(|&i| gene_names[i as usize].clone()).collect();
        edge_index = EdgeIndex::with_num_nodes(pairs, gene_names.len())?;
    }

    let num_nodes = gene_names.len();
    let num_features = modalities.len();

    // Per-modality column lookup and min-max range over kept genes.
    let mut columns = Vec::with_capacity(num_features);
    let mut ranges = Vec::with_capacity(num_features);
    for m in &modalities {
        let cols: Vec<usize> = gene_names.iter().map(|g| m.index[g.as_str()]).collect();
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for row in &m.values {
            for &c in &cols {
                lo = lo.min(row[c]);
                hi = hi.max(row[c]);
            }
        }
        columns.push(cols);
        ranges.push((lo, hi));
    }

    let mut graphs = Vec::with_capacity(num_samples);
    for (s, &label) in labels.iter().enumerate() {
        let mut x = vec![0.0f32; num_nodes * num_features];
        for (f, m) in modalities.iter().enumerate() {
            let (lo, hi) = ranges[f];
            let span = hi - lo;
            for n in 0..num_nodes {
                let v = m.values[s][columns[f][n]];
                x[n * num_features + f] = if config.normalize {
                    // Constant modality normalizes to 0 rather than NaN.
                    if span > 0.0 {
                        (v - lo) / span
                    } else {
                        0.0
                    }
                } else {
                    v
                };
            }
        }
        graphs.push(OmicsGraph::new(x, num_nodes, num_features, label)?);
    }

    info!(
        samples = graphs.len(),
        nodes = num_nodes,
        edges = edge_index.num_edges(),
        modalities = num_features,
        "omics dataset loaded"
    );
    OmicsDataset::new(graphs, edge_index, gene_names)
}

struct Modality {
    genes: Vec<String>,
    index: HashMap<String, usize>,
    values: Vec<Vec<f32>>,
}

fn read_ppi(path: &Path, cutoff: f32) -> Result<Vec<(String, String)>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(a), Some(b), Some(score)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::Parse {
                path: path.display().to_string(),
                line: lineno + 1,
                msg: "expected `gene1 gene2 confidence`".into(),
            });
        };
        let Ok(score) = score.parse::<f32>() else {
            // Header row.
            if lineno == 0 {
                continue;
            }
            return Err(Error::Parse {
                path: path.display().to_string(),
                line: lineno + 1,
                msg: format!("confidence `{score}` is not a number"),
            });
        };
        if score >= cutoff {
            out.push((a.to_string(), b.to_string()));
        }
    }

    Ok(out)
}

fn read_modality(path: &Path) -> Result<Modality> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header = lines.next().ok_or_else(|| Error::Parse {
        path: path.display().to_string(),
        line: 1,
        msg: "feature file is empty".into(),
    })??;
    let genes: Vec<String> = header.split_whitespace().map(str::to_string).collect();
    let index: HashMap<String, usize> = genes
        .iter()
        .enumerate()
        .map(|(i, g)| (g.clone(), i))
        .collect();

    let mut values = Vec::new();
    for (lineno, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|v| {
                v.parse::<f32>().map_err(|_| Error::Parse {
                    path: path.display().to_string(),
                    line: lineno + 2,
                    msg: format!("value `{v}` is not a number"),
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        if row.len() != genes.len() {
            return Err(Error::Shape {
                expected: genes.len(),
                got: row.len(),
            });
        }
        values.push(row);
    }

    Ok(Modality {
        genes,
        index,
        values,
    })
}

fn read_labels(path: &Path) -> Result<Vec<u32>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut labels = Vec::new();

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let label = line.parse::<u32>().map_err(|_| Error::Parse {
            path: path.display().to_string(),
            line: lineno + 1,
            msg: format!("label `{line}` is not an integer"),
        })?;
        labels.push(label);
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_small_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let ppi = write_file(
            dir.path(),
            "ppi.txt",
            "G1 G2 990\nG2 G3 970\nG1 G3 800\nG3 G4 960\n",
        );
        let feat = write_file(
            dir.path(),
            "mrna.txt",
            "G1 G2 G3 G4\n1.0 2.0 3.0 4.0\n4.0 3.0 2.0 1.0\n",
        );
        let target = write_file(dir.path(), "target.txt", "0\n1\n");

        let ds = load_omics_dataset(&ppi, &[&feat], &target, LoadConfig::default()).unwrap();

        // G1-G3 filtered by the 950 cutoff; graph stays connected.
        assert_eq!(ds.num_nodes(), 4);
        assert_eq!(ds.edge_index.num_edges(), 6);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.gene_names, vec!["G1", "G2", "G3", "G4"]);
        assert_eq!(ds.graphs[0].label(), 0);
        assert_eq!(ds.graphs[1].label(), 1);

        // Min-max normalized to [0, 1].
        for g in &ds.graphs {
            for &v in g.features() {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_load_restricts_to_largest_component() {
        let dir = tempfile::tempdir().unwrap();
        let ppi = write_file(
            dir.path(),
            "ppi.txt",
            "G1 G2 990\nG2 G3 990\nG4 G5 990\n",
        );
        let feat = write_file(
            dir.path(),
            "mrna.txt",
            "G1 G2 G3 G4 G5\n1 2 3 4 5\n",
        );
        let target = write_file(dir.path(), "target.txt", "1\n");

        let ds = load_omics_dataset(&ppi, &[&feat], &target, LoadConfig::default()).unwrap();

        assert_eq!(ds.gene_names, vec!["G1", "G2", "G3"]);
        assert_eq!(ds.num_nodes(), 3);
    }

    #[test]
    fn test_load_drops_genes_missing_from_features() {
        let dir = tempfile::tempdir().unwrap();
        let ppi = write_file(dir.path(), "ppi.txt", "G1 G2 990\nG2 G9 990\n");
        let feat = write_file(dir.path(), "mrna.txt", "G1 G2\n0.5 0.7\n");
        let target = write_file(dir.path(), "target.txt", "0\n");

        let ds = load_omics_dataset(&ppi, &[&feat], &target, LoadConfig::default()).unwrap();
        assert_eq!(ds.gene_names, vec!["G1", "G2"]);
    }

    #[test]
    fn test_load_rejects_label_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let ppi = write_file(dir.path(), "ppi.txt", "G1 G2 990\n");
        let feat = write_file(dir.path(), "mrna.txt", "G1 G2\n0.5 0.7\n");
        let target = write_file(dir.path(), "target.txt", "0\n1\n");

        assert!(load_omics_dataset(&ppi, &[&feat], &target, LoadConfig::default()).is_err());
    }
}

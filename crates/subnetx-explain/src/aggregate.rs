//! Multi-run explanation aggregation.
//!
//! A single mask optimization is sensitive to its initialization, so
//! the production entry point runs the explainer several times from
//! seeded starting points and averages the sigmoid-transformed masks.
//! Per-run masks are written as artifacts so downstream analysis can
//! inspect run-to-run stability.

use crate::edge_importance::calc_edge_importance;
use crate::explainer::{ExplainConfig, Explainer};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use subnetx_core::{io, EdgeIndex, OmicsGraph};
use subnetx_gnn::MaskedForward;
use tracing::info;

/// Aggregation parameters.
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Number of independent explanation runs.
    pub n_runs: usize,
    /// Run `i` is seeded with `base_seed + i`.
    pub base_seed: u64,
    /// Where per-run and aggregated artifacts land; `None` skips all
    /// file output.
    pub output_dir: Option<PathBuf>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            n_runs: 10,
            base_seed: 42,
            output_dir: None,
        }
    }
}

impl AggregateConfig {
    #[must_use]
    pub fn with_n_runs(mut self, n_runs: usize) -> Self {
        self.n_runs = n_runs;
        self
    }

    #[must_use]
    pub fn with_base_seed(mut self, base_seed: u64) -> Self {
        self.base_seed = base_seed;
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// The result of an aggregated explanation.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Mean sigmoid edge importance, aligned to the edge list.
    pub edge_mask: Vec<f32>,
    /// Mean sigmoid node importance, one per gene.
    pub node_mask: Vec<f32>,
    /// Per-run sigmoid node masks.
    pub run_node_masks: Vec<Vec<f32>>,
    /// Per-run sigmoid edge masks.
    pub run_edge_masks: Vec<Vec<f32>>,
}

impl Explanation {
    /// Per-edge variance across runs, a stability diagnostic.
    pub fn edge_variance(&self) -> Vec<f32> {
        variance_columns(&self.run_edge_masks, &self.edge_mask)
    }

    /// Per-node variance across runs.
    pub fn node_variance(&self) -> Vec<f32> {
        variance_columns(&self.run_node_masks, &self.node_mask)
    }
}

/// Numerically stable logistic function.
fn stable_sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Column-wise mean of equal-length rows, accumulated in f64.
fn mean_columns(rows: &[Vec<f32>]) -> Vec<f32> {
    let width = rows[0].len();
    let mut acc = vec![0.0f64; width];
    for row in rows {
        for (a, &v) in acc.iter_mut().zip(row) {
            *a += f64::from(v);
        }
    }
    let n = rows.len() as f64;
    acc.into_iter().map(|a| (a / n) as f32).collect()
}

fn variance_columns(rows: &[Vec<f32>], means: &[f32]) -> Vec<f32> {
    let n = rows.len() as f64;
    means
        .iter()
        .enumerate()
        .map(|(j, &m)| {
            let ss: f64 = rows
                .iter()
                .map(|row| {
                    let d = f64::from(row[j]) - f64::from(m);
                    d * d
                })
                .sum();
            (ss / n) as f32
        })
        .collect()
}

/// Run the explainer `n_runs` times and average the sigmoid masks.
///
/// Run `i` optimizes a fresh mask seeded `base_seed + i`; its raw node
/// weights are projected onto the edge list, both are pushed through
/// the sigmoid, and the per-run results are averaged column-wise. When
/// an output directory is configured, each run writes
/// `gnn_feature_masks{i}.csv` and `gnn_edge_masks{i}.csv` (3 decimals)
/// and the aggregate writes `edge_masks.txt` (5 decimals).
///
/// Any failing run aborts the whole aggregation.
pub fn aggregate_explanations<M: MaskedForward>(
    model: &M,
    graphs: &[OmicsGraph],
    edge_index: &EdgeIndex,
    config: &AggregateConfig,
    explain_config: &ExplainConfig,
) -> Result<Explanation> {
    if config.n_runs == 0 {
        return Err(Error::NoRuns);
    }
    if graphs.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if let Some(dir) = &config.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let explainer = Explainer::new(model, explain_config.clone());
    let mut run_node_masks = Vec::with_capacity(config.n_runs);
    let mut run_edge_masks = Vec::with_capacity(config.n_runs);

    for run in 0..config.n_runs {
        let seed = config.base_seed + run as u64;
        info!(run, seed, "explanation run");

        let raw = explainer.explain(graphs, seed)?;
        let raw_edges = calc_edge_importance(&raw, edge_index)?;

        let node_mask: Vec<f32> = raw.iter().map(|&v| stable_sigmoid(v)).collect();
        let edge_mask: Vec<f32> = raw_edges.iter().map(|&v| stable_sigmoid(v)).collect();

        if let Some(dir) = &config.output_dir {
            write_run_artifacts(dir, run, &node_mask, &edge_mask)?;
        }
        run_node_masks.push(node_mask);
        run_edge_masks.push(edge_mask);
    }

    let node_mask = mean_columns(&run_node_masks);
    let edge_mask = mean_columns(&run_edge_masks);

    if let Some(dir) = &config.output_dir {
        io::write_scores(dir.join("edge_masks.txt"), &edge_mask, 5)?;
    }

    Ok(Explanation {
        edge_mask,
        node_mask,
        run_node_masks,
        run_edge_masks,
    })
}

fn write_run_artifacts(dir: &Path, run: usize, nodes: &[f32], edges: &[f32]) -> Result<()> {
    io::write_scores(dir.join(format!("gnn_feature_masks{run}.csv")), nodes, 3)?;
    io::write_scores(dir.join(format!("gnn_edge_masks{run}.csv")), edges, 3)?;
    Ok(())
}

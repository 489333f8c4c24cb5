//! Subnetx CLI - disease subnetwork discovery from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Inspect a multi-omics dataset
//! subnetx stats --ppi ppi.txt --features mrna.txt --features methyl.txt --targets target.txt
//!
//! # Train a classifier and report holdout accuracy
//! subnetx train --ppi ppi.txt --features mrna.txt --targets target.txt --model gcn
//!
//! # Full pipeline: train, explain, detect disease subnetworks
//! subnetx explain --ppi ppi.txt --features mrna.txt --targets target.txt -o results/
//!
//! # Re-detect communities from previously written artifacts
//! subnetx communities --edge-index results/edge_index.txt --edge-masks results/edge_masks.txt
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use candle_core::Device;
use std::path::PathBuf;
use std::time::Instant;
use subnetx_core::{io, load_omics_dataset, LoadConfig, OmicsDataset};
use subnetx_explain::{
    explain_with_communities, find_communities, AggregateConfig, ExplainConfig,
};
use subnetx_gnn::{train_cheb, train_gcn, TrainConfig};

#[derive(Parser)]
#[command(name = "subnetx")]
#[command(about = "Disease subnetwork discovery with GNN explainers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DatasetArgs {
    /// PPI network file (`gene1 gene2 confidence` rows)
    #[arg(long)]
    ppi: PathBuf,

    /// Omics feature file, one per modality (repeatable)
    #[arg(long = "features", required = true)]
    features: Vec<PathBuf>,

    /// Target file, one class label per sample
    #[arg(long)]
    targets: PathBuf,

    /// PPI confidence cutoff
    #[arg(long, default_value = "950")]
    cutoff: f32,

    /// Skip min-max feature normalization
    #[arg(long)]
    no_normalize: bool,
}

#[derive(Args)]
struct ModelArgs {
    /// Classifier architecture
    #[arg(long, default_value = "gcn")]
    model: ModelKind,

    /// Training epochs
    #[arg(long, default_value = "200")]
    epochs: usize,

    /// Learning rate
    #[arg(long, default_value = "0.01")]
    lr: f64,

    /// Hidden layer width
    #[arg(long, default_value = "16")]
    hidden: usize,

    /// Chebyshev polynomial order (cheb model only)
    #[arg(long, default_value = "2")]
    cheb_order: usize,

    /// Random seed for the balanced split
    #[arg(long, default_value = "42")]
    seed: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics about a multi-omics dataset
    Stats {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Train a graph classifier and report holdout accuracy
    Train {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Save trained weights here (safetensors)
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Train, explain, and detect disease subnetworks
    Explain {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        model: ModelArgs,

        /// Output directory for artifacts
        #[arg(short, long)]
        output: PathBuf,

        /// Number of explanation runs to aggregate
        #[arg(long, default_value = "10")]
        runs: usize,

        /// Mask optimization epochs per run
        #[arg(long, default_value = "300")]
        mask_epochs: usize,

        /// Mask learning rate
        #[arg(long, default_value = "0.01")]
        mask_lr: f64,

        /// Mask entropy penalty weight
        #[arg(long, default_value = "0.0")]
        lambda: f64,

        /// Base seed; run i uses base_seed + i
        #[arg(long, default_value = "42")]
        base_seed: u64,

        /// Number of top communities to print
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Detect communities from previously written mask artifacts
    Communities {
        /// Edge index file (`src,dst` rows)
        #[arg(long)]
        edge_index: PathBuf,

        /// Aggregated edge mask file (one score per line)
        #[arg(long)]
        edge_masks: PathBuf,

        /// Optionally write communities.txt and communities_scores.txt here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelKind {
    /// Two-layer graph convolutional network
    Gcn,
    /// Chebyshev spectral network
    Cheb,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { dataset } => cmd_stats(&dataset),
        Commands::Train {
            dataset,
            model,
            save,
        } => cmd_train(&dataset, &model, save.as_deref()),
        Commands::Explain {
            dataset,
            model,
            output,
            runs,
            mask_epochs,
            mask_lr,
            lambda,
            base_seed,
            top,
        } => cmd_explain(
            &dataset,
            &model,
            &output,
            runs,
            mask_epochs,
            mask_lr,
            lambda,
            base_seed,
            top,
        ),
        Commands::Communities {
            edge_index,
            edge_masks,
            output,
        } => cmd_communities(&edge_index, &edge_masks, output.as_deref()),
    }
}

fn load_dataset(args: &DatasetArgs) -> Result<OmicsDataset> {
    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Loading {}...", args.ppi.display()));

    let config = LoadConfig::default()
        .with_cutoff(args.cutoff)
        .with_normalize(!args.no_normalize);
    let ds = load_omics_dataset(&args.ppi, &args.features, &args.targets, config)
        .with_context(|| format!("Failed to load dataset from {}", args.ppi.display()))?;

    pb.finish_with_message(format!("Loaded in {:.2?}", start.elapsed()));
    Ok(ds)
}

fn train_config(args: &ModelArgs) -> TrainConfig {
    TrainConfig::default()
        .with_epochs(args.epochs)
        .with_learning_rate(args.lr)
        .with_hidden(args.hidden)
        .with_cheb_order(args.cheb_order)
        .with_seed(args.seed)
}

fn cmd_stats(dataset: &DatasetArgs) -> Result<()> {
    let ds = load_dataset(dataset)?;

    let mut class_counts = std::collections::BTreeMap::new();
    for g in &ds.graphs {
        *class_counts.entry(g.label()).or_insert(0usize) += 1;
    }

    println!("Dataset Statistics");
    println!("==================");
    println!("Samples:    {}", ds.len());
    println!("Genes:      {}", ds.num_nodes());
    println!("Edges:      {} (directed)", ds.edge_index.num_edges());
    println!("Modalities: {}", ds.num_features());
    for (label, count) in class_counts {
        println!("Class {label}:    {count} samples");
    }

    Ok(())
}

fn cmd_train(
    dataset: &DatasetArgs,
    model: &ModelArgs,
    save: Option<&std::path::Path>,
) -> Result<()> {
    let ds = load_dataset(dataset)?;
    let config = train_config(model);

    println!(
        "Training (model={}, epochs={}, lr={})...",
        match model.model {
            ModelKind::Gcn => "gcn",
            ModelKind::Cheb => "cheb",
        },
        config.epochs,
        config.learning_rate
    );
    let start = Instant::now();

    let (accuracy, confusion, varmap) = match model.model {
        ModelKind::Gcn => {
            let out = train_gcn(&ds, &config, &Device::Cpu)?;
            (out.accuracy, out.confusion, out.varmap)
        }
        ModelKind::Cheb => {
            let out = train_cheb(&ds, &config, &Device::Cpu)?;
            (out.accuracy, out.confusion, out.varmap)
        }
    };
    println!("Trained in {:.2?}", start.elapsed());

    if let Some(path) = save {
        varmap
            .save(path)
            .with_context(|| format!("Failed to save weights to {}", path.display()))?;
        println!("Weights saved to {}", path.display());
    }

    println!("Holdout accuracy: {:.4}", accuracy);
    println!("Confusion matrix (rows = true class):");
    for (i, row) in confusion.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        println!("  class {i}: [{}]", cells.join(", "));
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_explain(
    dataset: &DatasetArgs,
    model: &ModelArgs,
    output: &PathBuf,
    runs: usize,
    mask_epochs: usize,
    mask_lr: f64,
    lambda: f64,
    base_seed: u64,
    top: usize,
) -> Result<()> {
    let ds = load_dataset(dataset)?;
    let config = train_config(model);

    println!("Training classifier...");
    let start = Instant::now();
    // The mask is optimized against the holdout split, so explanation
    // fidelity is measured on samples the classifier was not fitted on.
    let (explanation, mut modules) = match model.model {
        ModelKind::Gcn => {
            let out = train_gcn(&ds, &config, &Device::Cpu)?;
            println!(
                "Trained in {:.2?} (holdout accuracy {:.4})",
                start.elapsed(),
                out.accuracy
            );
            run_pipeline(
                &out.model,
                &out.holdout,
                &ds,
                output,
                runs,
                mask_epochs,
                mask_lr,
                lambda,
                base_seed,
            )?
        }
        ModelKind::Cheb => {
            let out = train_cheb(&ds, &config, &Device::Cpu)?;
            println!(
                "Trained in {:.2?} (holdout accuracy {:.4})",
                start.elapsed(),
                out.accuracy
            );
            run_pipeline(
                &out.model,
                &out.holdout,
                &ds,
                output,
                runs,
                mask_epochs,
                mask_lr,
                lambda,
                base_seed,
            )?
        }
    };

    modules.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    println!(
        "Detected {} subnetworks ({} edges explained)",
        modules.len(),
        explanation.edge_mask.len()
    );
    println!("Top {} subnetworks by importance:", top.min(modules.len()));
    for (i, m) in modules.iter().take(top).enumerate() {
        let genes: Vec<&str> = m
            .nodes
            .iter()
            .map(|&n| ds.gene_names[n as usize].as_str())
            .collect();
        println!(
            "{}. score {:.3}, {} genes: {}",
            i + 1,
            m.importance,
            genes.len(),
            genes.join(", ")
        );
    }
    println!("Artifacts written to {}", output.display());

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_pipeline<M: subnetx_gnn::MaskedForward>(
    model: &M,
    graphs: &[subnetx_core::OmicsGraph],
    ds: &OmicsDataset,
    output: &PathBuf,
    runs: usize,
    mask_epochs: usize,
    mask_lr: f64,
    lambda: f64,
    base_seed: u64,
) -> Result<(subnetx_explain::Explanation, Vec<subnetx_explain::Module>)> {
    println!(
        "Explaining {} holdout samples ({runs} runs, {mask_epochs} epochs each)...",
        graphs.len()
    );
    let start = Instant::now();

    let agg = AggregateConfig::default()
        .with_n_runs(runs)
        .with_base_seed(base_seed);
    let ec = ExplainConfig::default()
        .with_epochs(mask_epochs)
        .with_learning_rate(mask_lr)
        .with_lambda(lambda);

    let result = explain_with_communities(model, graphs, ds, output, &agg, &ec)
        .with_context(|| format!("Explanation pipeline failed (output {})", output.display()))?;
    println!("Explained in {:.2?}", start.elapsed());
    Ok(result)
}

fn cmd_communities(
    edge_index: &PathBuf,
    edge_masks: &PathBuf,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let start = Instant::now();
    let (scores, memberships) = find_communities(edge_index, edge_masks).with_context(|| {
        format!(
            "Community detection failed over {} / {}",
            edge_index.display(),
            edge_masks.display()
        )
    })?;
    println!("Detected {} communities in {:.2?}", memberships.len(), start.elapsed());

    for (i, (nodes, score)) in memberships.iter().zip(&scores).enumerate() {
        let row: Vec<String> = nodes.iter().map(ToString::to_string).collect();
        println!("{}. score {:.3}: [{}]", i + 1, score, row.join(", "));
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(dir)?;
        io::write_communities(dir.join("communities.txt"), &memberships)?;
        io::write_scores(dir.join("communities_scores.txt"), &scores, 3)?;
        println!("Written to {}", dir.display());
    }

    Ok(())
}

//! Classifier training.
//!
//! Omics cohorts are routinely imbalanced (far more controls than
//! cases), so the trainer downsamples every class to the size of the
//! rarest one before splitting. Optimization is AdamW over all model
//! variables with early stopping on holdout accuracy; the best weight
//! snapshot is restored at the end.

use crate::masked::MaskedForward;
use crate::{ChebClassifier, Error, GcnClassifier, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use subnetx_core::{OmicsDataset, OmicsGraph};
use tracing::{debug, info};

/// Training hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Maximum number of epochs.
    pub epochs: usize,
    /// AdamW learning rate.
    pub learning_rate: f64,
    /// Hidden width of the classifier.
    pub hidden: usize,
    /// Chebyshev polynomial order (spectral classifier only).
    pub cheb_order: usize,
    /// Seed for downsampling and the train/holdout shuffle.
    pub seed: u64,
    /// Stop after this many epochs without holdout improvement.
    pub patience: usize,
    /// Fraction of the balanced set used for training.
    pub train_fraction: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 200,
            learning_rate: 0.01,
            hidden: 16,
            cheb_order: 2,
            seed: 42,
            patience: 25,
            train_fraction: 0.8,
        }
    }
}

impl TrainConfig {
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    #[must_use]
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    #[must_use]
    pub fn with_hidden(mut self, hidden: usize) -> Self {
        self.hidden = hidden;
        self
    }

    #[must_use]
    pub fn with_cheb_order(mut self, k: usize) -> Self {
        self.cheb_order = k;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be >= 1".into()));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "train_fraction must be in (0, 1), got {}",
                self.train_fraction
            )));
        }
        Ok(())
    }
}

/// A trained classifier plus its evaluation on the holdout split.
pub struct TrainOutcome<M> {
    pub model: M,
    pub varmap: VarMap,
    /// Holdout accuracy of the restored best snapshot.
    pub accuracy: f64,
    /// Confusion counts indexed `[true class][predicted class]`.
    pub confusion: Vec<Vec<usize>>,
    /// The holdout samples themselves.
    pub holdout: Vec<OmicsGraph>,
}

/// Downsample every class to the size of the rarest one.
///
/// Within each class the kept samples are chosen by shuffle, so the
/// selection is deterministic under a fixed seed.
fn balanced_downsample(
    graphs: &[OmicsGraph],
    num_classes: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<OmicsGraph> {
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
    for (i, g) in graphs.iter().enumerate() {
        by_class[g.label() as usize].push(i);
    }
    let floor = by_class
        .iter()
        .filter(|c| !c.is_empty())
        .map(Vec::len)
        .min()
        .unwrap_or(0);

    let mut kept = Vec::with_capacity(floor * num_classes);
    for class in &mut by_class {
        class.shuffle(rng);
        kept.extend(class.iter().take(floor).copied());
    }
    kept.shuffle(rng);
    kept.into_iter().map(|i| graphs[i].clone()).collect()
}

fn infer_num_classes(graphs: &[OmicsGraph]) -> usize {
    graphs
        .iter()
        .map(|g| g.label() as usize + 1)
        .max()
        .unwrap_or(0)
        .max(2)
}

fn labels_tensor(graphs: &[OmicsGraph], device: &Device) -> Result<Tensor> {
    let labels: Vec<u32> = graphs.iter().map(OmicsGraph::label).collect();
    Ok(Tensor::from_vec(labels, graphs.len(), device)?)
}

fn accuracy_and_confusion<M: MaskedForward>(
    model: &M,
    graphs: &[OmicsGraph],
) -> Result<(f64, Vec<Vec<usize>>)> {
    let preds = model.predict(graphs)?;
    let c = model.num_classes();
    let mut confusion = vec![vec![0usize; c]; c];
    let mut hits = 0usize;
    for (g, &p) in graphs.iter().zip(&preds) {
        confusion[g.label() as usize][p as usize] += 1;
        if p == g.label() {
            hits += 1;
        }
    }
    Ok((hits as f64 / graphs.len() as f64, confusion))
}

fn snapshot(varmap: &VarMap) -> Result<Vec<Tensor>> {
    varmap
        .all_vars()
        .iter()
        .map(|v| Ok(v.as_tensor().copy()?))
        .collect()
}

fn restore(varmap: &VarMap, weights: &[Tensor]) -> Result<()> {
    for (var, w) in varmap.all_vars().iter().zip(weights) {
        var.set(w)?;
    }
    Ok(())
}

struct Splits {
    train: Vec<OmicsGraph>,
    holdout: Vec<OmicsGraph>,
    num_classes: usize,
}

fn prepare_splits(dataset: &OmicsDataset, config: &TrainConfig) -> Result<Splits> {
    config.validate()?;
    let num_classes = infer_num_classes(&dataset.graphs);

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let balanced = balanced_downsample(&dataset.graphs, num_classes, &mut rng);
    if balanced.len() < 2 {
        return Err(Error::InvalidConfig(format!(
            "balanced set has {} samples, need at least 2",
            balanced.len()
        )));
    }

    let split = ((balanced.len() as f64 * config.train_fraction) as usize)
        .clamp(1, balanced.len() - 1);
    let (train, holdout) = balanced.split_at(split);
    debug!(
        train = train.len(),
        holdout = holdout.len(),
        num_classes,
        "balanced split prepared"
    );
    Ok(Splits {
        train: train.to_vec(),
        holdout: holdout.to_vec(),
        num_classes,
    })
}

fn fit<M: MaskedForward>(
    model: &M,
    varmap: &VarMap,
    splits: &Splits,
    config: &TrainConfig,
) -> Result<(f64, Vec<Vec<usize>>)> {
    let device = model.device().clone();
    let train_labels = labels_tensor(&splits.train, &device)?;

    let mut opt = AdamW::new(
        varmap.all_vars(),
        ParamsAdamW {
            lr: config.learning_rate,
            ..Default::default()
        },
    )?;

    let mut best_acc = f64::NEG_INFINITY;
    let mut best_weights = snapshot(varmap)?;
    let mut stale = 0usize;

    for epoch in 0..config.epochs {
        let logits = model.logits(&splits.train)?;
        let loss = candle_nn::loss::cross_entropy(&logits, &train_labels)?;
        opt.backward_step(&loss)?;

        let (acc, _) = accuracy_and_confusion(model, &splits.holdout)?;
        if acc > best_acc {
            best_acc = acc;
            best_weights = snapshot(varmap)?;
            stale = 0;
        } else {
            stale += 1;
        }

        if epoch % 20 == 0 {
            debug!(
                epoch,
                loss = loss.to_scalar::<f32>()?,
                holdout_acc = acc,
                "training"
            );
        }
        if stale >= config.patience {
            info!(epoch, best_acc, "early stopping");
            break;
        }
    }

    restore(varmap, &best_weights)?;
    accuracy_and_confusion(model, &splits.holdout)
}

/// Train a two-layer GCN classifier on a balanced split of `dataset`.
pub fn train_gcn(
    dataset: &OmicsDataset,
    config: &TrainConfig,
    device: &Device,
) -> Result<TrainOutcome<GcnClassifier>> {
    let splits = prepare_splits(dataset, config)?;

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let model = GcnClassifier::new(
        &dataset.edge_index,
        dataset.num_features(),
        config.hidden,
        splits.num_classes,
        vb,
    )?;

    let (accuracy, confusion) = fit(&model, &varmap, &splits, config)?;
    info!(accuracy, "gcn training finished");
    Ok(TrainOutcome {
        model,
        varmap,
        accuracy,
        confusion,
        holdout: splits.holdout,
    })
}

/// Train a Chebyshev spectral classifier on a balanced split of `dataset`.
pub fn train_cheb(
    dataset: &OmicsDataset,
    config: &TrainConfig,
    device: &Device,
) -> Result<TrainOutcome<ChebClassifier>> {
    let splits = prepare_splits(dataset, config)?;

    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let model = ChebClassifier::new(
        &dataset.edge_index,
        dataset.num_features(),
        config.hidden,
        config.cheb_order,
        splits.num_classes,
        vb,
    )?;

    let (accuracy, confusion) = fit(&model, &varmap, &splits, config)?;
    info!(accuracy, "cheb training finished");
    Ok(TrainOutcome {
        model,
        varmap,
        accuracy,
        confusion,
        holdout: splits.holdout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use subnetx_core::EdgeIndex;

    fn toy_dataset() -> OmicsDataset {
        let edges = EdgeIndex::from_pairs(vec![(0, 1), (1, 0), (1, 2), (2, 1)]).unwrap();
        // Class 0 clusters near zero, class 1 near one.
        let mut graphs = Vec::new();
        for i in 0..8 {
            let base = 0.02 * i as f32;
            graphs.push(OmicsGraph::new(vec![base, base, base], 3, 1, 0).unwrap());
            graphs.push(
                OmicsGraph::new(vec![1.0 - base, 1.0 - base, 1.0 - base], 3, 1, 1).unwrap(),
            );
        }
        OmicsDataset::new(graphs, edges, vec!["A".into(), "B".into(), "C".into()]).unwrap()
    }

    #[test]
    fn test_balanced_downsample_equalizes() {
        let mut graphs = Vec::new();
        for _ in 0..9 {
            graphs.push(OmicsGraph::new(vec![0.0, 0.0], 2, 1, 0).unwrap());
        }
        for _ in 0..3 {
            graphs.push(OmicsGraph::new(vec![1.0, 1.0], 2, 1, 1).unwrap());
        }

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let balanced = balanced_downsample(&graphs, 2, &mut rng);
        assert_eq!(balanced.len(), 6);
        let ones = balanced.iter().filter(|g| g.label() == 1).count();
        assert_eq!(ones, 3);
    }

    #[test]
    fn test_downsample_deterministic_under_seed() {
        let mut graphs = Vec::new();
        for i in 0..10 {
            graphs.push(OmicsGraph::new(vec![i as f32], 1, 1, (i % 2) as u32).unwrap());
        }

        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);
        let a = balanced_downsample(&graphs, 2, &mut rng_a);
        let b = balanced_downsample(&graphs, 2, &mut rng_b);

        let feats = |gs: &[OmicsGraph]| -> Vec<f32> { gs.iter().map(|g| g.feature(0, 0)).collect() };
        assert_eq!(feats(&a), feats(&b));
    }

    #[test]
    fn test_train_gcn_separable() {
        let ds = toy_dataset();
        let config = TrainConfig::default().with_epochs(150).with_hidden(8);

        let outcome = train_gcn(&ds, &config, &Device::Cpu).unwrap();
        assert!(
            outcome.accuracy >= 0.5,
            "accuracy {} below chance",
            outcome.accuracy
        );
        assert_eq!(outcome.confusion.len(), 2);
        assert!(!outcome.holdout.is_empty());
    }

    #[test]
    fn test_train_rejects_zero_epochs() {
        let ds = toy_dataset();
        let config = TrainConfig::default().with_epochs(0);
        assert!(train_gcn(&ds, &config, &Device::Cpu).is_err());
    }
}

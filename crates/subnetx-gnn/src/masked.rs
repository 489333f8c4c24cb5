//! Masked forward contract.
//!
//! The explainer never looks inside a classifier; it only needs a way
//! to push a batch of samples through with a soft node mask applied to
//! the input features. [`MaskedForward`] is that seam: any model that
//! implements it can be explained.

use crate::{ops, Error, Result};
use candle_core::{Device, Tensor, D};
use subnetx_core::OmicsGraph;

/// A classifier whose forward pass accepts a soft node mask.
///
/// `mask` is an (N, 1) tensor of per-node weights in `[0, 1]`; masked
/// logits are computed from `X * mask` broadcast across the feature
/// dimension. Implementations must keep the mask inside the autograd
/// graph so gradients flow back to it.
pub trait MaskedForward {
    fn device(&self) -> &Device;

    fn num_nodes(&self) -> usize;

    fn num_classes(&self) -> usize;

    /// Logits (B, C) for `graphs` with `mask` multiplied into the node
    /// features of every sample.
    fn masked_logits(&self, graphs: &[OmicsGraph], mask: &Tensor) -> Result<Tensor>;

    /// Unmasked logits (B, C): forward with an all-ones mask.
    fn logits(&self, graphs: &[OmicsGraph]) -> Result<Tensor> {
        let ones = Tensor::ones((self.num_nodes(), 1), candle_core::DType::F32, self.device())?;
        self.masked_logits(graphs, &ones)
    }

    /// Hard class predictions via argmax over the logits.
    fn predict(&self, graphs: &[OmicsGraph]) -> Result<Vec<u32>> {
        let logits = self.logits(graphs)?;
        Ok(logits.argmax(D::Minus1)?.to_vec1::<u32>()?)
    }
}

fn stack_masked_logits<F>(graphs: &[OmicsGraph], mask: &Tensor, forward: F) -> Result<Tensor>
where
    F: Fn(&Tensor) -> Result<Tensor>,
{
    if graphs.is_empty() {
        return Err(Error::EmptyBatch);
    }
    let mut rows = Vec::with_capacity(graphs.len());
    for g in graphs {
        let x = ops::features_tensor(g, mask.device())?.broadcast_mul(mask)?;
        rows.push(forward(&x)?);
    }
    Ok(Tensor::stack(&rows, 0)?)
}

impl MaskedForward for crate::GcnClassifier {
    fn device(&self) -> &Device {
        self.device()
    }

    fn num_nodes(&self) -> usize {
        self.num_nodes()
    }

    fn num_classes(&self) -> usize {
        self.num_classes()
    }

    fn masked_logits(&self, graphs: &[OmicsGraph], mask: &Tensor) -> Result<Tensor> {
        stack_masked_logits(graphs, mask, |x| self.forward_graph(x))
    }
}

impl MaskedForward for crate::ChebClassifier {
    fn device(&self) -> &Device {
        self.device()
    }

    fn num_nodes(&self) -> usize {
        self.num_nodes()
    }

    fn num_classes(&self) -> usize {
        self.num_classes()
    }

    fn masked_logits(&self, graphs: &[OmicsGraph], mask: &Tensor) -> Result<Tensor> {
        stack_masked_logits(graphs, mask, |x| self.forward_graph(x))
    }
}

/// Batched view over a [`ChebClassifier`].
///
/// Stacks the whole sample set into one (B, N, F) tensor and runs a
/// single batched matmul per Chebyshev order instead of a per-graph
/// loop. Worth it when explaining against the full dataset.
pub struct DatasetBatch<'a>(pub &'a crate::ChebClassifier);

impl MaskedForward for DatasetBatch<'_> {
    fn device(&self) -> &Device {
        self.0.device()
    }

    fn num_nodes(&self) -> usize {
        self.0.num_nodes()
    }

    fn num_classes(&self) -> usize {
        self.0.num_classes()
    }

    fn masked_logits(&self, graphs: &[OmicsGraph], mask: &Tensor) -> Result<Tensor> {
        if graphs.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let xs = graphs
            .iter()
            .map(|g| ops::features_tensor(g, mask.device()))
            .collect::<Result<Vec<_>>>()?;
        let batch = Tensor::stack(&xs, 0)?.broadcast_mul(mask)?;
        self.0.forward_batch(&batch)
    }
}

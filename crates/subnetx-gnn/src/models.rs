//! Graph classifiers.
//!
//! Two classifier families over the shared PPI structure:
//!
//! - [`GcnClassifier`]: two GCN layers (Kipf & Welling, 2017) with mean
//!   pooling, the workhorse for omics graph classification.
//! - [`ChebClassifier`]: one Chebyshev spectral convolution
//!   (Defferrard et al., 2016) of order K with max pooling.
//!
//! Both expose a per-graph forward over an (N, F) feature tensor and are
//! frozen from the explainer's point of view: masking never touches
//! their weights.

use crate::ops;
use crate::{Error, Result};
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};
use subnetx_core::EdgeIndex;

/// Two-layer graph convolutional classifier.
///
/// `logits = W_head * mean_pool(relu(A_hat relu(A_hat X W1) W2))`
pub struct GcnClassifier {
    adj: Tensor,
    lin1: Linear,
    lin2: Linear,
    head: Linear,
    device: Device,
    num_nodes: usize,
    num_classes: usize,
}

impl GcnClassifier {
    /// Create a classifier over a fixed PPI structure.
    pub fn new(
        edge_index: &EdgeIndex,
        in_features: usize,
        hidden: usize,
        num_classes: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        if num_classes < 2 {
            return Err(Error::InvalidConfig(format!(
                "need at least 2 classes, got {num_classes}"
            )));
        }
        let device = vb.device().clone();
        let adj = ops::normalized_adjacency(edge_index, &device)?;
        let lin1 = linear(in_features, hidden, vb.pp("lin1"))?;
        let lin2 = linear(hidden, hidden, vb.pp("lin2"))?;
        let head = linear(hidden, num_classes, vb.pp("head"))?;
        Ok(Self {
            adj,
            lin1,
            lin2,
            head,
            device,
            num_nodes: edge_index.num_nodes(),
            num_classes,
        })
    }

    /// Logits for one graph; `x` is (N, F), output is (num_classes,).
    pub fn forward_graph(&self, x: &Tensor) -> Result<Tensor> {
        let h = self.adj.matmul(&self.lin1.forward(x)?)?.relu()?;
        let h = self.adj.matmul(&self.lin2.forward(&h)?)?.relu()?;
        let pooled = h.mean(0)?;
        Ok(self.head.forward(&pooled.unsqueeze(0)?)?.squeeze(0)?)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

/// Chebyshev spectral classifier of polynomial order K.
///
/// Feature maps follow the recurrence `T_0 = X`, `T_1 = L_tilde X`,
/// `T_k = 2 L_tilde T_{k-1} - T_{k-2}`, each with its own weight matrix;
/// graph readout is global max pooling (the spectral family in the omics
/// setting pools by max, not mean).
pub struct ChebClassifier {
    lap: Tensor,
    coeffs: Vec<Linear>,
    head: Linear,
    device: Device,
    num_nodes: usize,
    num_classes: usize,
    k: usize,
}

impl ChebClassifier {
    pub fn new(
        edge_index: &EdgeIndex,
        in_features: usize,
        hidden: usize,
        k: usize,
        num_classes: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidConfig("Chebyshev order K must be >= 1".into()));
        }
        if num_classes < 2 {
            return Err(Error::InvalidConfig(format!(
                "need at least 2 classes, got {num_classes}"
            )));
        }
        let device = vb.device().clone();
        let lap = ops::scaled_laplacian(edge_index, &device)?;
        let coeffs = (0..k)
            .map(|i| linear(in_features, hidden, vb.pp(format!("cheb{i}"))))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let head = linear(hidden, num_classes, vb.pp("head"))?;
        Ok(Self {
            lap,
            coeffs,
            head,
            device,
            num_nodes: edge_index.num_nodes(),
            num_classes,
            k,
        })
    }

    /// Chebyshev feature map before pooling. Works on a single graph
    /// (N, F) or a stacked batch (B, N, F): the Laplacian is broadcast
    /// over the leading batch dimension.
    fn cheb_features(&self, x: &Tensor, lap: &Tensor) -> Result<Tensor> {
        let mut t_prev = x.clone();
        let mut z = self.coeffs[0].forward(&t_prev)?;
        if self.k > 1 {
            let mut t_cur = lap.matmul(x)?;
            z = z.add(&self.coeffs[1].forward(&t_cur)?)?;
            for c in self.coeffs.iter().skip(2) {
                let t_next = lap.matmul(&t_cur)?.affine(2.0, 0.0)?.sub(&t_prev)?;
                z = z.add(&c.forward(&t_next)?)?;
                t_prev = t_cur;
                t_cur = t_next;
            }
        }
        Ok(z.relu()?)
    }

    /// Logits for one graph; `x` is (N, F), output is (num_classes,).
    pub fn forward_graph(&self, x: &Tensor) -> Result<Tensor> {
        let h = self.cheb_features(x, &self.lap)?;
        let pooled = h.max(0)?;
        Ok(self.head.forward(&pooled.unsqueeze(0)?)?.squeeze(0)?)
    }

    /// Logits for a stacked batch; `x` is (B, N, F), output is (B, C).
    pub fn forward_batch(&self, x: &Tensor) -> Result<Tensor> {
        let b = x.dim(0)?;
        let lap = self.lap.unsqueeze(0)?.repeat((b, 1, 1))?;
        let h = self.cheb_features(x, &lap)?;
        let pooled = h.max(1)?;
        Ok(self.head.forward(&pooled)?)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

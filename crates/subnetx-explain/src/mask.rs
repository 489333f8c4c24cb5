//! Learnable node mask.

use crate::Result;
use candle_core::{Device, Tensor, Var};
use candle_nn::ops;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The single learnable parameter of an explanation run: one raw weight
/// per gene, shaped (N, 1) so it broadcasts across feature modalities.
///
/// Raw weights live in logit space; [`MaskParams::soft`] maps them
/// through a sigmoid to the `[0, 1]` mask the forward pass consumes.
pub struct MaskParams {
    raw: Var,
}

impl MaskParams {
    /// Initialize raw weights uniformly in `[-0.1, 0.1)` from a seeded
    /// generator, so each run of a multi-run explanation starts from its
    /// own reproducible point.
    pub fn new(num_nodes: usize, seed: u64, device: &Device) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let init: Vec<f32> = (0..num_nodes).map(|_| rng.gen_range(-0.1..0.1)).collect();
        let raw = Var::from_tensor(&Tensor::from_vec(init, (num_nodes, 1), device)?)?;
        Ok(Self { raw })
    }

    /// The trainable variable, for handing to an optimizer.
    pub fn var(&self) -> &Var {
        &self.raw
    }

    /// Soft mask in `[0, 1]`, still attached to the autograd graph.
    pub fn soft(&self) -> Result<Tensor> {
        Ok(ops::sigmoid(self.raw.as_tensor())?)
    }

    /// Raw mask weights, detached.
    pub fn raw_values(&self) -> Result<Vec<f32>> {
        Ok(self
            .raw
            .as_tensor()
            .detach()
            .squeeze(1)?
            .to_vec1::<f32>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_range() {
        let m = MaskParams::new(64, 3, &Device::Cpu).unwrap();
        for v in m.raw_values().unwrap() {
            assert!((-0.1..0.1).contains(&v));
        }
    }

    #[test]
    fn test_soft_mask_in_unit_interval() {
        let m = MaskParams::new(16, 0, &Device::Cpu).unwrap();
        let soft: Vec<Vec<f32>> = m.soft().unwrap().to_vec2().unwrap();
        for row in soft {
            for v in row {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_seed_determinism() {
        let a = MaskParams::new(32, 9, &Device::Cpu).unwrap();
        let b = MaskParams::new(32, 9, &Device::Cpu).unwrap();
        let c = MaskParams::new(32, 10, &Device::Cpu).unwrap();

        assert_eq!(a.raw_values().unwrap(), b.raw_values().unwrap());
        assert_ne!(a.raw_values().unwrap(), c.raw_values().unwrap());
    }
}

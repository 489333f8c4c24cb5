//! Dense graph tensor operators.
//!
//! The PPI graphs this workspace handles are small enough (a few
//! thousand genes) that dense N x N operators beat sparse scatter ops on
//! CPU, so adjacency and Laplacian are materialized as plain tensors.

use crate::Result;
use candle_core::{Device, Tensor};
use subnetx_core::{EdgeIndex, OmicsGraph};

/// Node feature matrix of one sample as an (N, F) tensor.
pub fn features_tensor(graph: &OmicsGraph, device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(
        graph.features(),
        (graph.num_nodes(), graph.num_features()),
        device,
    )?)
}

fn dense_adjacency(edge_index: &EdgeIndex, self_loops: bool) -> (Vec<f32>, usize) {
    let n = edge_index.num_nodes();
    let mut adj = vec![0.0f32; n * n];
    for &(s, t) in edge_index.pairs() {
        adj[s as usize * n + t as usize] = 1.0;
        adj[t as usize * n + s as usize] = 1.0;
    }
    if self_loops {
        for i in 0..n {
            adj[i * n + i] = 1.0;
        }
    }
    (adj, n)
}

fn symmetric_normalize(adj: &mut [f32], n: usize) {
    let mut deg = vec![0.0f32; n];
    for (i, d) in deg.iter_mut().enumerate() {
        *d = adj[i * n..(i + 1) * n].iter().sum();
    }
    // Degree guard keeps isolated nodes from dividing by zero.
    let dinv: Vec<f32> = deg.iter().map(|d| 1.0 / (d + 1e-6).sqrt()).collect();
    for i in 0..n {
        for j in 0..n {
            adj[i * n + j] *= dinv[i] * dinv[j];
        }
    }
}

/// Symmetric-normalized adjacency with self-loops:
/// `A_hat = D^{-1/2} (A + I) D^{-1/2}` (Kipf & Welling convention).
pub fn normalized_adjacency(edge_index: &EdgeIndex, device: &Device) -> Result<Tensor> {
    let (mut adj, n) = dense_adjacency(edge_index, true);
    symmetric_normalize(&mut adj, n);
    Ok(Tensor::from_vec(adj, (n, n), device)?)
}

/// Scaled Laplacian for Chebyshev convolutions.
///
/// With the usual `lambda_max = 2` convention,
/// `L_tilde = L - I = -D^{-1/2} A D^{-1/2}` (no self-loops).
pub fn scaled_laplacian(edge_index: &EdgeIndex, device: &Device) -> Result<Tensor> {
    let (mut adj, n) = dense_adjacency(edge_index, false);
    symmetric_normalize(&mut adj, n);
    for v in &mut adj {
        *v = -*v;
    }
    Ok(Tensor::from_vec(adj, (n, n), device)?)
}

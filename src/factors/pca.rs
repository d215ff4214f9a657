//! # Pca
//!
//! Principal components of the centered/scaled return panel, recomputed from
//! scratch over the full sample on every call. Working on the pairwise
//! correlation matrix is equivalent to PCA on standardized returns and keeps
//! the decomposition insensitive to per-ticker volatility scale.

use nalgebra::DMatrix;
use ndarray::Array2;

use crate::data::panel::ReturnPanel;
use crate::error::Result;

/// Ordered eigen decomposition of the return correlation structure.
#[derive(Clone, Debug)]
pub struct PcaResult {
  /// Ticker order of the loading columns.
  pub tickers: Vec<String>,
  /// Eigenvalues, descending, negatives from pairwise estimation clamped to 0.
  pub eigenvalues: Vec<f64>,
  /// Fraction of total variance explained per component, descending.
  pub explained_variance: Vec<f64>,
  /// `loadings[k][i]` is the weight of ticker `i` in component `k`.
  pub loadings: Vec<Vec<f64>>,
}

/// PCA of the panel's pairwise-complete correlation matrix.
pub fn principal_components(panel: &ReturnPanel) -> Result<PcaResult> {
  let corr = panel.pairwise_correlation()?;
  let decomp = decompose(&corr);

  Ok(PcaResult {
    tickers: panel.tickers().to_vec(),
    eigenvalues: decomp.0,
    explained_variance: decomp.1,
    loadings: decomp.2,
  })
}

fn decompose(corr: &Array2<f64>) -> (Vec<f64>, Vec<f64>, Vec<Vec<f64>>) {
  let n = corr.nrows();
  let m = DMatrix::from_fn(n, n, |i, j| corr[(i, j)]);
  let eig = m.symmetric_eigen();

  let mut order: Vec<usize> = (0..n).collect();
  order.sort_by(|&a, &b| {
    eig.eigenvalues[b]
      .partial_cmp(&eig.eigenvalues[a])
      .unwrap_or(std::cmp::Ordering::Equal)
  });

  // Pairwise-complete estimation can push small eigenvalues below zero.
  let eigenvalues: Vec<f64> = order
    .iter()
    .map(|&k| eig.eigenvalues[k].max(0.0))
    .collect();

  let total: f64 = eigenvalues.iter().sum();
  let explained: Vec<f64> = if total > 1e-15 {
    eigenvalues.iter().map(|&l| l / total).collect()
  } else {
    vec![0.0; n]
  };

  let loadings: Vec<Vec<f64>> = order
    .iter()
    .map(|&k| eig.eigenvectors.column(k).iter().copied().collect())
    .collect();

  (eigenvalues, explained, loadings)
}

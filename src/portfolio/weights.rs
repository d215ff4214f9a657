//! # Weights
//!
//! $$
//! \min_{\mathbf{w}} \ \tfrac{\gamma}{2}\mathbf{w}^\top\Sigma\mathbf{w}
//!   - \mu^\top\mathbf{w}
//! \quad \text{s.t.} \quad \textstyle\sum_i w_i = 1,\ 0 \le w_i \le w_{\max}
//! $$
//!
//! Four deterministic weight constructions over the ticker universe. Each
//! scheme is an independent snapshot; every returned vector sums to 1 within
//! floating tolerance.

use ndarray::Array2;

use crate::error::Error;
use crate::error::Result;

/// Weight construction scheme labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightScheme {
  Equal,
  InverseVolatility,
  ReturnProportional,
  MeanVariance,
}

impl std::fmt::Display for WeightScheme {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::Equal => "equal",
      Self::InverseVolatility => "inverse-volatility",
      Self::ReturnProportional => "return-proportional",
      Self::MeanVariance => "mean-variance",
    };
    f.write_str(s)
  }
}

/// A finished weight vector for one scheme.
#[derive(Clone, Debug)]
pub struct WeightVector {
  pub scheme: WeightScheme,
  pub tickers: Vec<String>,
  pub weights: Vec<f64>,
}

/// Configuration for the mean-variance solve.
#[derive(Clone, Copy, Debug)]
pub struct MeanVarianceConfig {
  /// Risk aversion gamma.
  pub gamma: f64,
  /// Per-asset weight cap.
  pub max_w: f64,
  pub max_iters: usize,
  pub tol: f64,
}

impl Default for MeanVarianceConfig {
  fn default() -> Self {
    Self {
      gamma: 5.0,
      max_w: 0.30,
      max_iters: 10_000,
      tol: 1e-12,
    }
  }
}

/// `1/n` for every ticker.
pub fn equal_weights(n: usize) -> Result<Vec<f64>> {
  if n == 0 {
    return Err(Error::InsufficientData(
      "equal weights need a non-empty universe".to_string(),
    ));
  }
  Ok(vec![1.0 / n as f64; n])
}

/// Weights proportional to `1 / sigma`, normalized to sum 1.
pub fn inverse_volatility_weights(sigmas: &[f64]) -> Result<Vec<f64>> {
  if sigmas.is_empty() {
    return Err(Error::InsufficientData(
      "inverse-volatility weights need a non-empty universe".to_string(),
    ));
  }
  if let Some(bad) = sigmas.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
    return Err(Error::MalformedInput(format!(
      "inverse-volatility weights need positive volatilities, got {bad}"
    )));
  }

  let inv: Vec<f64> = sigmas.iter().map(|s| 1.0 / s).collect();
  let total: f64 = inv.iter().sum();
  Ok(inv.iter().map(|v| v / total).collect())
}

/// Weights proportional to full-sample cumulative return.
///
/// A non-positive raw score sum would normalize into degenerate or negative
/// weights, so it is rejected instead.
pub fn return_proportional_weights(cumulative: &[f64]) -> Result<Vec<f64>> {
  if cumulative.is_empty() {
    return Err(Error::InsufficientData(
      "return-proportional weights need a non-empty universe".to_string(),
    ));
  }

  let total: f64 = cumulative.iter().sum();
  if !(total.is_finite() && total > 0.0) {
    return Err(Error::DegenerateWeight {
      scheme: WeightScheme::ReturnProportional.to_string(),
      raw_sum: total,
    });
  }

  Ok(cumulative.iter().map(|c| c / total).collect())
}

/// Euclidean projection onto `{ w : sum w = 1, 0 <= w <= cap }` by bisecting
/// the budget multiplier.
fn project_capped_simplex(v: &[f64], cap: f64) -> Vec<f64> {
  let clamp = |tau: f64| -> Vec<f64> {
    v.iter().map(|x| (x - tau).clamp(0.0, cap)).collect()
  };
  let budget = |tau: f64| -> f64 { clamp(tau).iter().sum::<f64>() - 1.0 };

  let vmin = v.iter().cloned().fold(f64::INFINITY, f64::min);
  let vmax = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let mut lo = vmin - cap - 1.0; // budget(lo) = n * cap >= 1
  let mut hi = vmax; // budget(hi) = -1

  for _ in 0..200 {
    let mid = 0.5 * (lo + hi);
    if budget(mid) > 0.0 {
      lo = mid;
    } else {
      hi = mid;
    }
  }

  clamp(0.5 * (lo + hi))
}

/// Box-and-budget constrained mean-variance weights via projected gradient
/// descent. Infeasible caps (`max_w * n < 1`) are rejected up front.
pub fn mean_variance_weights(
  mu: &[f64],
  cov: &Array2<f64>,
  cfg: &MeanVarianceConfig,
) -> Result<Vec<f64>> {
  let n = mu.len();
  if n == 0 {
    return Err(Error::InsufficientData(
      "mean-variance weights need a non-empty universe".to_string(),
    ));
  }
  if cov.dim() != (n, n) {
    return Err(Error::MalformedInput(format!(
      "covariance shape {:?} does not match {n} tickers",
      cov.dim()
    )));
  }
  if !(cfg.gamma.is_finite() && cfg.gamma > 0.0) {
    return Err(Error::MalformedInput(format!(
      "risk aversion gamma must be positive, got {}",
      cfg.gamma
    )));
  }
  if cfg.max_w * (n as f64) < 1.0 {
    return Err(Error::InfeasibleConstraint(format!(
      "max_w {} with {n} tickers cannot reach a unit budget",
      cfg.max_w
    )));
  }

  // Lipschitz bound on the gradient via the covariance row sums.
  let row_norm = (0..n)
    .map(|i| (0..n).map(|j| cov[(i, j)].abs()).sum::<f64>())
    .fold(0.0f64, f64::max);
  let step = 1.0 / (cfg.gamma * row_norm).max(1e-12);

  let mut w = project_capped_simplex(&vec![1.0 / n as f64; n], cfg.max_w);

  for _ in 0..cfg.max_iters {
    // grad = gamma * Sigma w - mu
    let grad: Vec<f64> = (0..n)
      .map(|i| {
        let sw: f64 = (0..n).map(|j| cov[(i, j)] * w[j]).sum();
        cfg.gamma * sw - mu[i]
      })
      .collect();

    let trial: Vec<f64> = (0..n).map(|i| w[i] - step * grad[i]).collect();
    let next = project_capped_simplex(&trial, cfg.max_w);

    let delta = w
      .iter()
      .zip(next.iter())
      .map(|(a, b)| (a - b).abs())
      .fold(0.0f64, f64::max);
    w = next;
    if delta < cfg.tol {
      break;
    }
  }

  if !w.iter().all(|x| x.is_finite()) {
    return Err(Error::ModelFit {
      model: "mean-variance".to_string(),
      reason: "projected gradient produced non-finite weights".to_string(),
    });
  }

  Ok(w)
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;
  use ndarray::arr2;
  use ndarray::Array2;

  fn assert_sums_to_one(w: &[f64]) {
    let sum: f64 = w.iter().sum();
    assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
  }

  #[test]
  fn equal_weights_sum_to_one() {
    let w = equal_weights(7).unwrap();
    assert_sums_to_one(&w);
    assert_abs_diff_eq!(w[0], 1.0 / 7.0, epsilon = 1e-15);
  }

  #[test]
  fn inverse_volatility_favors_the_quiet_asset() {
    let w = inverse_volatility_weights(&[0.01, 0.02, 0.04]).unwrap();
    assert_sums_to_one(&w);
    assert!(w[0] > w[1] && w[1] > w[2]);
    // 1/0.01 : 1/0.02 : 1/0.04 = 4 : 2 : 1
    assert!((w[0] - 4.0 / 7.0).abs() < 1e-12);
  }

  #[test]
  fn inverse_volatility_rejects_zero_sigma() {
    assert!(inverse_volatility_weights(&[0.01, 0.0]).is_err());
  }

  #[test]
  fn return_proportional_weights_normalize() {
    let w = return_proportional_weights(&[0.3, 0.1, 0.6]).unwrap();
    assert_sums_to_one(&w);
    assert!((w[2] - 0.6).abs() < 1e-12);
  }

  #[test]
  fn return_proportional_rejects_non_positive_sum() {
    let err = return_proportional_weights(&[0.1, -0.3]).unwrap_err();
    assert!(matches!(err, Error::DegenerateWeight { .. }));
  }

  #[test]
  fn capped_simplex_projection_respects_budget_and_caps() {
    let w = project_capped_simplex(&[0.9, 0.5, -0.2, 0.1], 0.4);
    let sum: f64 = w.iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);
    assert!(w.iter().all(|&x| (-1e-12..=0.4 + 1e-12).contains(&x)));
  }

  #[test]
  fn mean_variance_weights_satisfy_constraints() {
    let mu = vec![0.08, 0.05, 0.12, 0.02, 0.07];
    let cov = Array2::eye(5) * 0.04;
    let cfg = MeanVarianceConfig::default();
    let w = mean_variance_weights(&mu, &cov, &cfg).unwrap();

    assert_sums_to_one(&w);
    assert!(w.iter().all(|&x| (-1e-9..=cfg.max_w + 1e-9).contains(&x)));
    // The highest-mean asset should hit the cap with identity risk.
    assert!((w[2] - cfg.max_w).abs() < 1e-6);
  }

  #[test]
  fn mean_variance_prefers_low_covariance() {
    let mu = vec![0.05, 0.05];
    let cov = arr2(&[[0.09, 0.0], [0.0, 0.01]]);
    let cfg = MeanVarianceConfig {
      max_w: 1.0,
      ..Default::default()
    };
    let w = mean_variance_weights(&mu, &cov, &cfg).unwrap();

    assert_sums_to_one(&w);
    assert!(w[1] > w[0], "low-variance asset should dominate: {w:?}");
  }

  #[test]
  fn mean_variance_rejects_infeasible_cap() {
    let mu = vec![0.05; 3];
    let cov = Array2::eye(3);
    let cfg = MeanVarianceConfig {
      max_w: 0.2,
      ..Default::default()
    };
    let err = mean_variance_weights(&mu, &cov, &cfg).unwrap_err();
    assert!(matches!(err, Error::InfeasibleConstraint(_)));
  }
}

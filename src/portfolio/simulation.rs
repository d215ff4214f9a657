//! # Simulation
//!
//! $$
//! R_p = \exp\!\left(\mathbf{w}^\top \mathbf{c}\right) - 1, \qquad
//! \mathbf{c} = H \cdot \mathbf{z} \ \ \text{or} \ \ \sum_{h=1}^{H}\mathbf{z}_h
//! $$
//!
//! Monte Carlo projection of multi-horizon portfolio return distributions
//! from zero-mean multivariate normal daily draws. Paths are summarized and
//! discarded; only the distribution statistics survive.
//!
//! The `RepeatedDraw` scheme reproduces the source pipeline exactly: a
//! horizon of `H` days reuses one single-day draw `H` times per path, which
//! understates multi-day variance relative to independent compounding. The
//! `IndependentDraws` scheme is the corrected alternative; which one runs is
//! an explicit configuration choice.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Distribution;
use statrs::distribution::MultivariateNormal;

use crate::error::Error;
use crate::error::Result;

/// How a multi-day horizon accumulates daily draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizonScheme {
  /// One daily draw per path, repeated `H` times (source behavior).
  #[default]
  RepeatedDraw,
  /// `H` independent daily draws per path.
  IndependentDraws,
}

/// Monte Carlo settings.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
  /// Independent paths per (strategy, horizon).
  pub n_paths: usize,
  /// Horizons in trading days.
  pub horizons: Vec<usize>,
  pub seed: u64,
  pub scheme: HorizonScheme,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      n_paths: 5000,
      horizons: vec![21, 63, 126, 252],
      seed: 42,
      scheme: HorizonScheme::RepeatedDraw,
    }
  }
}

/// Distribution statistics of the simulated portfolio return.
#[derive(Clone, Copy, Debug)]
pub struct SimulationSummary {
  pub horizon: usize,
  pub mean: f64,
  pub std_dev: f64,
  pub p5: f64,
  pub p95: f64,
}

/// Linear-interpolated percentile of a sorted sample.
fn percentile(sorted: &[f64], p: f64) -> f64 {
  if sorted.is_empty() {
    return f64::NAN;
  }
  let pos = p * (sorted.len() - 1) as f64;
  let lo = pos.floor() as usize;
  let hi = pos.ceil() as usize;
  if lo == hi {
    sorted[lo]
  } else {
    let frac = pos - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
  }
}

/// Simulate one (weights, horizon) pair and summarize the return distribution.
pub fn simulate_portfolio(
  weights: &[f64],
  cov: &Array2<f64>,
  horizon: usize,
  cfg: &SimulationConfig,
) -> Result<SimulationSummary> {
  let n = weights.len();
  if n == 0 || horizon == 0 || cfg.n_paths == 0 {
    return Err(Error::InsufficientData(format!(
      "simulation needs assets, paths and a positive horizon (n={n}, paths={}, h={horizon})",
      cfg.n_paths
    )));
  }
  if cov.dim() != (n, n) {
    return Err(Error::MalformedInput(format!(
      "covariance shape {:?} does not match {n} weights",
      cov.dim()
    )));
  }

  // The multivariate sampler is also the PSD gatekeeper: a covariance that
  // fails its decomposition is a data defect, not a simulation failure.
  let mvn = MultivariateNormal::new(
    vec![0.0; n],
    cov.iter().copied().collect(),
  )
  .map_err(|e| Error::MalformedInput(format!("covariance is not usable for sampling: {e}")))?;

  let mut rng = StdRng::seed_from_u64(cfg.seed);
  let mut returns = Vec::with_capacity(cfg.n_paths);

  for _ in 0..cfg.n_paths {
    let mut cumulative = vec![0.0f64; n];

    match cfg.scheme {
      HorizonScheme::RepeatedDraw => {
        let z = mvn.sample(&mut rng);
        for i in 0..n {
          cumulative[i] = horizon as f64 * z[i];
        }
      }
      HorizonScheme::IndependentDraws => {
        for _ in 0..horizon {
          let z = mvn.sample(&mut rng);
          for i in 0..n {
            cumulative[i] += z[i];
          }
        }
      }
    }

    let log_port: f64 = weights.iter().zip(cumulative.iter()).map(|(w, c)| w * c).sum();
    returns.push(log_port.exp() - 1.0);
  }

  let n_f = returns.len() as f64;
  let mean = returns.iter().sum::<f64>() / n_f;
  let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n_f - 1.0);

  let mut sorted = returns;
  sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

  Ok(SimulationSummary {
    horizon,
    mean,
    std_dev: var.sqrt(),
    p5: percentile(&sorted, 0.05),
    p95: percentile(&sorted, 0.95),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use ndarray::Array2;

  #[test]
  fn single_day_identity_covariance_matches_theory() {
    // 2 assets, identity covariance, equal weights, H=1:
    // portfolio log return ~ N(0, w' I w) with sd sqrt(0.5).
    let cov = Array2::eye(2);
    let cfg = SimulationConfig {
      n_paths: 5000,
      ..Default::default()
    };
    let s = simulate_portfolio(&[0.5, 0.5], &cov, 1, &cfg).unwrap();

    let sd_log = 0.5f64.sqrt();
    // E[e^X - 1] = e^{sigma^2/2} - 1 for lognormal X.
    let expected_mean = (sd_log * sd_log / 2.0f64).exp() - 1.0;
    assert!((s.mean - expected_mean).abs() < 0.1, "mean {}", s.mean);
    assert!(s.p5 < 0.0 && s.p95 > 0.0);
  }

  #[test]
  fn five_ticker_monthly_scenario_is_roughly_symmetric() {
    // Sigma = I * 0.0004, N = 5000, H = 21 under the faithful repeated-draw
    // scheme: daily portfolio sd = sqrt(0.0004 / 5) = 0.00894, scaled by 21.
    let cov = Array2::eye(5) * 0.0004;
    let cfg = SimulationConfig::default();
    let s = simulate_portfolio(&[0.2; 5], &cov, 21, &cfg).unwrap();

    assert!(s.mean.abs() < 0.2, "mean {}", s.mean);
    assert!(s.p5 < 0.0 && s.p95 > 0.0);
    // Percentiles roughly symmetric around 0.
    assert!((s.p95 + s.p5).abs() < 0.5 * (s.p95 - s.p5));
  }

  #[test]
  fn five_ticker_monthly_scenario_with_independent_draws_centers_near_zero() {
    let cov = Array2::eye(5) * 0.0004;
    let cfg = SimulationConfig {
      scheme: HorizonScheme::IndependentDraws,
      ..Default::default()
    };
    let s = simulate_portfolio(&[0.2; 5], &cov, 21, &cfg).unwrap();

    assert!(s.mean.abs() < 0.01, "mean {}", s.mean);
    assert!(s.p5 < 0.0 && s.p95 > 0.0);
  }

  #[test]
  fn repeated_draw_scales_sd_linearly_in_horizon() {
    let cov = Array2::eye(1) * 1e-6;
    let cfg = SimulationConfig {
      n_paths: 4000,
      ..Default::default()
    };
    let s1 = simulate_portfolio(&[1.0], &cov, 1, &cfg).unwrap();
    let s21 = simulate_portfolio(&[1.0], &cov, 21, &cfg).unwrap();

    // For tiny sigma, exp is ~linear: sd grows ~H under repeated draws.
    let ratio = s21.std_dev / s1.std_dev;
    assert!((ratio - 21.0).abs() < 2.0, "ratio {ratio}");
  }

  #[test]
  fn independent_draws_scale_sd_with_sqrt_horizon() {
    let cov = Array2::eye(1) * 1e-6;
    let cfg = SimulationConfig {
      n_paths: 4000,
      scheme: HorizonScheme::IndependentDraws,
      ..Default::default()
    };
    let s1 = simulate_portfolio(&[1.0], &cov, 1, &cfg).unwrap();
    let s25 = simulate_portfolio(&[1.0], &cov, 25, &cfg).unwrap();

    let ratio = s25.std_dev / s1.std_dev;
    assert!((ratio - 5.0).abs() < 1.0, "ratio {ratio}");
  }

  #[test]
  fn same_seed_reproduces_identical_summaries() {
    let cov = Array2::eye(3) * 0.0004;
    let cfg = SimulationConfig::default();
    let a = simulate_portfolio(&[0.4, 0.3, 0.3], &cov, 21, &cfg).unwrap();
    let b = simulate_portfolio(&[0.4, 0.3, 0.3], &cov, 21, &cfg).unwrap();

    assert_eq!(a.mean, b.mean);
    assert_eq!(a.std_dev, b.std_dev);
    assert_eq!(a.p5, b.p5);
    assert_eq!(a.p95, b.p95);
  }

  #[test]
  fn rejects_non_psd_covariance() {
    // Correlation magnitude above 1 cannot be a covariance.
    let cov = ndarray::arr2(&[[1.0, 2.0], [2.0, 1.0]]);
    let err = simulate_portfolio(&[0.5, 0.5], &cov, 1, &SimulationConfig::default()).unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
  }

  #[test]
  fn percentile_interpolates() {
    let xs = vec![0.0, 1.0, 2.0, 3.0, 4.0];
    assert_eq!(percentile(&xs, 0.5), 2.0);
    assert!((percentile(&xs, 0.05) - 0.2).abs() < 1e-12);
  }
}

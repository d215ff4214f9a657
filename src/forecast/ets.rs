//! # Ets
//!
//! $$
//! \ell_t = \alpha y_t + (1-\alpha)(\ell_{t-1}+b_{t-1}), \qquad
//! b_t = \beta(\ell_t-\ell_{t-1}) + (1-\beta) b_{t-1}
//! $$
//!
//! Holt linear exponential smoothing over price levels. Smoothing parameters
//! are searched with Nelder-Mead over a logistic transform so the simplex can
//! roam unconstrained while `(alpha, beta)` stay inside `(0, 1)`.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::solver::neldermead::NelderMead;

use crate::error::Error;
use crate::error::Result;
use crate::forecast::FittedForecaster;
use crate::forecast::Forecaster;

/// Holt's linear method with optimized smoothing parameters.
#[derive(Clone, Copy, Debug)]
pub struct HoltEts {
  pub min_obs: usize,
  pub max_iters: u64,
}

impl Default for HoltEts {
  fn default() -> Self {
    Self {
      min_obs: 10,
      max_iters: 500,
    }
  }
}

/// Smoothed terminal state plus the parameters that produced it.
#[derive(Clone, Copy, Debug)]
pub struct FittedEts {
  pub alpha: f64,
  pub beta: f64,
  pub level: f64,
  pub trend: f64,
  pub sse: f64,
}

impl FittedForecaster for FittedEts {
  fn forecast(&self, horizon: usize) -> Vec<f64> {
    (1..=horizon)
      .map(|h| self.level + h as f64 * self.trend)
      .collect()
  }
}

fn logistic(x: f64) -> f64 {
  1.0 / (1.0 + (-x).exp())
}

/// One-step-ahead SSE of the Holt recursions, plus the terminal state.
fn holt_pass(series: &[f64], alpha: f64, beta: f64) -> (f64, f64, f64) {
  let mut level = series[0];
  let mut trend = series[1] - series[0];
  let mut sse = 0.0;

  for &y in &series[2..] {
    let pred = level + trend;
    let e = y - pred;
    sse += e * e;

    let prev_level = level;
    level = alpha * y + (1.0 - alpha) * (level + trend);
    trend = beta * (level - prev_level) + (1.0 - beta) * trend;
  }

  (sse, level, trend)
}

struct HoltCost {
  series: Vec<f64>,
}

impl CostFunction for HoltCost {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let alpha = logistic(x[0]);
    let beta = logistic(x[1]);
    let (sse, _, _) = holt_pass(&self.series, alpha, beta);
    Ok(if sse.is_finite() { sse } else { f64::MAX })
  }
}

impl Forecaster for HoltEts {
  fn label(&self) -> &'static str {
    "ets-holt"
  }

  fn fit(&self, series: &[f64]) -> Result<Box<dyn FittedForecaster>> {
    Ok(Box::new(self.fit_ets(series)?))
  }
}

impl HoltEts {
  /// Fit with the concrete result type exposed.
  pub fn fit_ets(&self, series: &[f64]) -> Result<FittedEts> {
    if series.len() < self.min_obs {
      return Err(Error::InsufficientData(format!(
        "ets fit: {} observations < required {}",
        series.len(),
        self.min_obs
      )));
    }

    let cost = HoltCost {
      series: series.to_vec(),
    };

    let simplex = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
    let solver = NelderMead::new(simplex)
      .with_sd_tolerance(1e-8)
      .map_err(|e| Error::ModelFit {
        model: "ets-holt".to_string(),
        reason: e.to_string(),
      })?;

    let res = Executor::new(cost, solver)
      .configure(|state| state.max_iters(self.max_iters))
      .run()
      .map_err(|e| Error::ModelFit {
        model: "ets-holt".to_string(),
        reason: e.to_string(),
      })?;

    let best = res.state.best_param.ok_or_else(|| Error::ModelFit {
      model: "ets-holt".to_string(),
      reason: "optimizer returned no parameters".to_string(),
    })?;

    let alpha = logistic(best[0]);
    let beta = logistic(best[1]);
    let (sse, level, trend) = holt_pass(series, alpha, beta);

    if !(level.is_finite() && trend.is_finite() && sse.is_finite()) {
      return Err(Error::ModelFit {
        model: "ets-holt".to_string(),
        reason: "non-finite smoothed state".to_string(),
      });
    }

    Ok(FittedEts {
      alpha,
      beta,
      level,
      trend,
      sse,
    })
  }
}

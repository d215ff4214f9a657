//! # Garch
//!
//! $$
//! \ell(\theta) = \sum_t \left[ \ln f_\nu\!\left(\tfrac{r_t}{\sigma_t}\right)
//!   - \ln \sigma_t \right]
//! $$
//!
//! GARCH(1,1) with zero conditional mean and Student-t standardized
//! residuals, fitted by maximum likelihood with Nelder-Mead over transformed
//! parameters. The transform keeps `omega > 0`, `alpha, beta >= 0`,
//! `alpha + beta < 1` and `nu > 2` for every simplex vertex, so the raw
//! search is unconstrained.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::solver::neldermead::NelderMead;
use statrs::function::gamma::ln_gamma;

use crate::error::Error;
use crate::error::Result;

const NU_FLOOR: f64 = 2.05;

/// Fit options for the GARCH(1,1)-t estimator.
#[derive(Clone, Copy, Debug)]
pub struct GarchConfig {
  pub min_obs: usize,
  pub max_iters: u64,
}

impl Default for GarchConfig {
  fn default() -> Self {
    Self {
      min_obs: 50,
      max_iters: 2000,
    }
  }
}

/// Fitted GARCH(1,1)-t parameters and the one-step-ahead variance forecast.
#[derive(Clone, Copy, Debug)]
pub struct GarchFit {
  pub omega: f64,
  pub alpha: f64,
  pub beta: f64,
  /// Student-t degrees of freedom of the standardized residuals.
  pub nu: f64,
  /// One-step-ahead conditional variance.
  pub sigma2_next: f64,
  pub log_likelihood: f64,
}

impl GarchFit {
  /// One-step-ahead conditional volatility.
  pub fn sigma_next(&self) -> f64 {
    self.sigma2_next.sqrt()
  }
}

fn logistic(x: f64) -> f64 {
  1.0 / (1.0 + (-x).exp())
}

/// Raw optimizer coordinates -> (omega, alpha, beta, nu).
fn unpack(x: &[f64]) -> (f64, f64, f64, f64) {
  let omega = x[0].exp();
  // Persistence s = alpha + beta in (0, 1), split by g.
  let s = logistic(x[1]);
  let g = logistic(x[2]);
  let alpha = s * g;
  let beta = s * (1.0 - g);
  let nu = NU_FLOOR + x[3].exp();
  (omega, alpha, beta, nu)
}

/// Negative log-likelihood of the unit-variance Student-t GARCH recursion.
fn neg_log_likelihood(returns: &[f64], omega: f64, alpha: f64, beta: f64, nu: f64) -> f64 {
  let n = returns.len() as f64;
  let sample_var = returns.iter().map(|r| r * r).sum::<f64>() / n;

  let const_term = ln_gamma((nu + 1.0) / 2.0)
    - ln_gamma(nu / 2.0)
    - 0.5 * (std::f64::consts::PI * (nu - 2.0)).ln();

  let mut sigma2 = sample_var.max(1e-12);
  let mut ll = 0.0;

  for (t, &r) in returns.iter().enumerate() {
    if t > 0 {
      sigma2 = omega + alpha * returns[t - 1].powi(2) + beta * sigma2;
    }
    if !(sigma2.is_finite() && sigma2 > 0.0) {
      return f64::MAX;
    }
    ll += const_term
      - 0.5 * sigma2.ln()
      - (nu + 1.0) / 2.0 * (1.0 + r * r / ((nu - 2.0) * sigma2)).ln();
  }

  if ll.is_finite() {
    -ll
  } else {
    f64::MAX
  }
}

struct GarchCost {
  returns: Vec<f64>,
}

impl CostFunction for GarchCost {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
    let (omega, alpha, beta, nu) = unpack(x);
    Ok(neg_log_likelihood(&self.returns, omega, alpha, beta, nu))
  }
}

/// Fit GARCH(1,1)-t to a return series and forecast next-period variance.
pub fn fit_garch11_t(returns: &[f64], cfg: &GarchConfig) -> Result<GarchFit> {
  if returns.len() < cfg.min_obs {
    return Err(Error::InsufficientData(format!(
      "garch fit: {} returns < required {}",
      returns.len(),
      cfg.min_obs
    )));
  }

  let n = returns.len() as f64;
  let sample_var = (returns.iter().map(|r| r * r).sum::<f64>() / n).max(1e-12);

  // Start near the usual equity-daily regime: persistence 0.9 with a small
  // ARCH share, nu = 8, omega matching the unconditional variance.
  let x0 = vec![(0.1 * sample_var).ln(), 2.2, -2.2, (8.0 - NU_FLOOR).ln()];
  let mut simplex = Vec::with_capacity(x0.len() + 1);
  simplex.push(x0.clone());
  for i in 0..x0.len() {
    let mut v = x0.clone();
    v[i] += 0.5;
    simplex.push(v);
  }

  let cost = GarchCost {
    returns: returns.to_vec(),
  };

  let solver = NelderMead::new(simplex)
    .with_sd_tolerance(1e-8)
    .map_err(|e| Error::ModelFit {
      model: "garch(1,1)-t".to_string(),
      reason: e.to_string(),
    })?;

  let res = Executor::new(cost, solver)
    .configure(|state| state.max_iters(cfg.max_iters))
    .run()
    .map_err(|e| Error::ModelFit {
      model: "garch(1,1)-t".to_string(),
      reason: e.to_string(),
    })?;

  let best_cost = res.state.best_cost;
  let best = res.state.best_param.ok_or_else(|| Error::ModelFit {
    model: "garch(1,1)-t".to_string(),
    reason: "optimizer returned no parameters".to_string(),
  })?;

  if !best_cost.is_finite() || best_cost == f64::MAX {
    return Err(Error::ModelFit {
      model: "garch(1,1)-t".to_string(),
      reason: "likelihood did not attain a finite value".to_string(),
    });
  }

  let (omega, alpha, beta, nu) = unpack(&best);

  // Replay the filter at the optimum for the one-step-ahead variance.
  let mut sigma2 = sample_var;
  for t in 1..returns.len() {
    sigma2 = omega + alpha * returns[t - 1].powi(2) + beta * sigma2;
  }
  let sigma2_next = omega + alpha * returns[returns.len() - 1].powi(2) + beta * sigma2;

  if !(sigma2_next.is_finite() && sigma2_next > 0.0) {
    return Err(Error::ModelFit {
      model: "garch(1,1)-t".to_string(),
      reason: format!("degenerate one-step variance forecast {sigma2_next}"),
    });
  }

  Ok(GarchFit {
    omega,
    alpha,
    beta,
    nu,
    sigma2_next,
    log_likelihood: -best_cost,
  })
}

//! # Arima
//!
//! $$
//! r_t = c + \sum_{j=1}^{p} \phi_j r_{t-j} + \varepsilon_t
//! $$
//!
//! Autoregressive model over log-returns with automatic order selection by
//! AIC. Candidate orders share the same effective sample (the first
//! `max_order` observations are always dropped) so their criteria are
//! comparable.

use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::Error;
use crate::error::Result;
use crate::forecast::FittedForecaster;
use crate::forecast::Forecaster;

/// AR(p) with order searched over `0..=max_order` minimizing AIC.
#[derive(Clone, Copy, Debug)]
pub struct AutoAr {
  pub max_order: usize,
  /// Minimum effective observations after lagging.
  pub min_obs: usize,
}

impl Default for AutoAr {
  fn default() -> Self {
    Self {
      max_order: 5,
      min_obs: 30,
    }
  }
}

/// Fitted AR(p): intercept, lag coefficients and the sample tail needed to
/// iterate forecasts forward.
#[derive(Clone, Debug)]
pub struct FittedAr {
  pub order: usize,
  pub intercept: f64,
  /// `coef[j]` multiplies lag `j + 1`.
  pub coef: Vec<f64>,
  pub aic: f64,
  tail: Vec<f64>,
}

impl FittedForecaster for FittedAr {
  fn forecast(&self, horizon: usize) -> Vec<f64> {
    let mut buf = self.tail.clone();
    let mut out = Vec::with_capacity(horizon);

    for _ in 0..horizon {
      let mut y = self.intercept;
      for (j, &phi) in self.coef.iter().enumerate() {
        y += phi * buf[buf.len() - 1 - j];
      }
      out.push(y);
      buf.push(y);
    }

    out
  }
}

impl Forecaster for AutoAr {
  fn label(&self) -> &'static str {
    "ar-aic"
  }

  fn fit(&self, series: &[f64]) -> Result<Box<dyn FittedForecaster>> {
    Ok(Box::new(self.fit_ar(series)?))
  }
}

impl AutoAr {
  /// Fit with the concrete result type exposed.
  pub fn fit_ar(&self, series: &[f64]) -> Result<FittedAr> {
    let n = series.len();
    let rows = n.saturating_sub(self.max_order);
    if rows < self.min_obs {
      return Err(Error::InsufficientData(format!(
        "ar fit: {rows} effective observations < required {}",
        self.min_obs
      )));
    }

    let y = DVector::from_fn(rows, |r, _| series[self.max_order + r]);

    let mut best: Option<FittedAr> = None;
    for p in 0..=self.max_order {
      let x = DMatrix::from_fn(rows, p + 1, |r, c| {
        if c == 0 {
          1.0
        } else {
          series[self.max_order + r - c]
        }
      });

      let beta = x
        .clone()
        .svd(true, true)
        .solve(&y, 1e-12)
        .map_err(|e| Error::ModelFit {
          model: format!("ar({p})"),
          reason: e.to_string(),
        })?;

      let resid = &y - &x * &beta;
      let rss: f64 = resid.iter().map(|e| e * e).sum();
      let aic = rows as f64 * (rss.max(1e-300) / rows as f64).ln() + 2.0 * (p + 1) as f64;

      if !beta.iter().all(|b| b.is_finite()) || !aic.is_finite() {
        return Err(Error::ModelFit {
          model: format!("ar({p})"),
          reason: "non-finite coefficients or criterion".to_string(),
        });
      }

      if best.as_ref().map_or(true, |b| aic < b.aic) {
        best = Some(FittedAr {
          order: p,
          intercept: beta[0],
          coef: beta.iter().skip(1).copied().collect(),
          aic,
          tail: series[n - self.max_order.max(1)..].to_vec(),
        });
      }
    }

    Ok(best.expect("at least order 0 is evaluated"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::Rng;
  use rand::SeedableRng;
  use rand_distr::Distribution;
  use rand_distr::Normal;

  fn ar1_sample(phi: f64, c: f64, sigma: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, sigma).unwrap();
    let mut out = Vec::with_capacity(n);
    let mut prev = 0.0;
    for _ in 0..n {
      let y = c + phi * prev + noise.sample(&mut rng);
      out.push(y);
      prev = y;
    }
    out
  }

  #[test]
  fn recovers_ar1_coefficient() {
    let series = ar1_sample(0.6, 0.001, 0.01, 600, 7);
    let fitted = AutoAr::default().fit_ar(&series).unwrap();

    assert!(fitted.order >= 1);
    assert!((fitted.coef[0] - 0.6).abs() < 0.1);
  }

  #[test]
  fn white_noise_selects_low_order() {
    let mut rng = StdRng::seed_from_u64(3);
    let series: Vec<f64> = (0..600).map(|_| rng.gen_range(-0.01..0.01)).collect();
    let fitted = AutoAr::default().fit_ar(&series).unwrap();

    // Whatever order AIC lands on, no coefficient should look material.
    assert!(fitted.coef.iter().all(|c| c.abs() < 0.3));
  }

  #[test]
  fn forecast_converges_to_unconditional_mean() {
    let series = ar1_sample(0.5, 0.002, 0.005, 600, 11);
    let fitted = AutoAr::default().fit_ar(&series).unwrap();
    let fc = fitted.forecast(200);

    assert_eq!(fc.len(), 200);
    let mu = fitted.intercept / (1.0 - fitted.coef.iter().sum::<f64>());
    assert!((fc[199] - mu).abs() < 1e-6);
  }

  #[test]
  fn rejects_short_series() {
    let err = AutoAr::default().fit_ar(&[0.01; 10]).unwrap_err();
    assert!(matches!(err, Error::InsufficientData(_)));
  }
}

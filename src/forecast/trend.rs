//! # Trend
//!
//! $$
//! y_t = m + k t + \sum_j \delta_j (t - c_j)_+ + s_{t \bmod 5} + \varepsilon_t
//! $$
//!
//! Prophet-style decomposition over price levels: piecewise linear trend with
//! evenly spaced changepoints plus a trading-week seasonal profile, fitted in
//! one least-squares solve. The changepoint grid is fixed up front rather
//! than searched.

use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::Error;
use crate::error::Result;
use crate::forecast::FittedForecaster;
use crate::forecast::Forecaster;

const WEEK: usize = 5;

/// Piecewise linear trend + weekly seasonality regression.
#[derive(Clone, Copy, Debug)]
pub struct TrendDecomposition {
  /// Number of interior changepoints, evenly spaced over the sample.
  pub changepoints: usize,
  pub min_obs: usize,
}

impl Default for TrendDecomposition {
  fn default() -> Self {
    Self {
      changepoints: 3,
      min_obs: 30,
    }
  }
}

/// Fitted decomposition; forecasting extends the time index past the sample.
#[derive(Clone, Debug)]
pub struct FittedTrend {
  coef: Vec<f64>,
  knots: Vec<f64>,
  n: usize,
}

fn feature_row(t: usize, knots: &[f64], out: &mut [f64]) {
  let tf = t as f64;
  out[0] = 1.0;
  out[1] = tf;
  for (j, &c) in knots.iter().enumerate() {
    out[2 + j] = (tf - c).max(0.0);
  }
  // Trading-day-of-week dummies, last weekday absorbed by the intercept.
  let base = 2 + knots.len();
  for d in 0..WEEK - 1 {
    out[base + d] = if t % WEEK == d { 1.0 } else { 0.0 };
  }
}

impl FittedForecaster for FittedTrend {
  fn forecast(&self, horizon: usize) -> Vec<f64> {
    let width = self.coef.len();
    let mut row = vec![0.0; width];
    (0..horizon)
      .map(|h| {
        feature_row(self.n + h, &self.knots, &mut row);
        row.iter().zip(&self.coef).map(|(x, b)| x * b).sum()
      })
      .collect()
  }
}

impl Forecaster for TrendDecomposition {
  fn label(&self) -> &'static str {
    "trend-seasonal"
  }

  fn fit(&self, series: &[f64]) -> Result<Box<dyn FittedForecaster>> {
    Ok(Box::new(self.fit_trend(series)?))
  }
}

impl TrendDecomposition {
  /// Fit with the concrete result type exposed.
  pub fn fit_trend(&self, series: &[f64]) -> Result<FittedTrend> {
    let n = series.len();
    if n < self.min_obs {
      return Err(Error::InsufficientData(format!(
        "trend fit: {n} observations < required {}",
        self.min_obs
      )));
    }

    let knots: Vec<f64> = (1..=self.changepoints)
      .map(|j| n as f64 * j as f64 / (self.changepoints + 1) as f64)
      .collect();

    let width = 2 + knots.len() + (WEEK - 1);
    let mut rows = vec![vec![0.0; width]; n];
    for (t, row) in rows.iter_mut().enumerate() {
      feature_row(t, &knots, row);
    }
    let x = DMatrix::from_fn(n, width, |r, c| rows[r][c]);
    let y = DVector::from_column_slice(series);

    let beta = x.svd(true, true).solve(&y, 1e-12).map_err(|e| Error::ModelFit {
      model: "trend-seasonal".to_string(),
      reason: e.to_string(),
    })?;

    if !beta.iter().all(|b| b.is_finite()) {
      return Err(Error::ModelFit {
        model: "trend-seasonal".to_string(),
        reason: "non-finite regression coefficients".to_string(),
      });
    }

    Ok(FittedTrend {
      coef: beta.iter().copied().collect(),
      knots,
      n,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn recovers_a_straight_line() {
    let series: Vec<f64> = (0..100).map(|t| 10.0 + 0.25 * t as f64).collect();
    let fitted = TrendDecomposition::default().fit_trend(&series).unwrap();
    let fc = fitted.forecast(10);

    for (h, v) in fc.iter().enumerate() {
      let expected = 10.0 + 0.25 * (100 + h) as f64;
      assert!((v - expected).abs() < 1e-6, "h={h} got {v} want {expected}");
    }
  }

  #[test]
  fn follows_a_slope_change() {
    // Slope 1.0 for the first half, 0.0 after.
    let series: Vec<f64> = (0..120)
      .map(|t| if t < 60 { t as f64 } else { 60.0 })
      .collect();
    let fitted = TrendDecomposition::default().fit_trend(&series).unwrap();
    let fc = fitted.forecast(5);

    // Extension should stay near the flat tail, nowhere near slope-1 levels.
    for v in &fc {
      assert!((v - 60.0).abs() < 3.0, "forecast {v} strayed from the tail");
    }
  }

  #[test]
  fn captures_weekly_profile() {
    let profile = [3.0, -1.0, 0.5, -2.0, 0.0];
    let series: Vec<f64> = (0..100).map(|t| 50.0 + profile[t % 5]).collect();
    let fitted = TrendDecomposition::default().fit_trend(&series).unwrap();
    let fc = fitted.forecast(10);

    for (h, v) in fc.iter().enumerate() {
      let expected = 50.0 + profile[(100 + h) % 5];
      assert!((v - expected).abs() < 1e-6, "h={h} got {v} want {expected}");
    }
  }

  #[test]
  fn rejects_short_series() {
    let err = TrendDecomposition::default()
      .fit_trend(&[1.0; 5])
      .unwrap_err();
    assert!(matches!(err, Error::InsufficientData(_)));
  }
}

//! # Returns
//!
//! $$
//! r_t = \ln\frac{S_t}{S_{t-1}}, \qquad
//! \hat\sigma_t = \operatorname{sd}(r_{t-w+1},\dots,r_t)
//! $$
//!
//! Log-return derivation and trailing rolling volatility.

use chrono::NaiveDate;

use crate::data::prices::PriceSeries;
use crate::error::Error;
use crate::error::Result;

/// One dated return observation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReturnObs {
  pub date: NaiveDate,
  pub value: f64,
}

/// Log-return series for one ticker, first price observation dropped.
#[derive(Clone, Debug)]
pub struct ReturnSeries {
  ticker: String,
  obs: Vec<ReturnObs>,
}

impl ReturnSeries {
  pub fn new(ticker: impl Into<String>, obs: Vec<ReturnObs>) -> Self {
    Self {
      ticker: ticker.into(),
      obs,
    }
  }

  pub fn ticker(&self) -> &str {
    &self.ticker
  }

  pub fn obs(&self) -> &[ReturnObs] {
    &self.obs
  }

  pub fn len(&self) -> usize {
    self.obs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.obs.is_empty()
  }

  pub fn values(&self) -> Vec<f64> {
    self.obs.iter().map(|o| o.value).collect()
  }

  pub fn dates(&self) -> Vec<NaiveDate> {
    self.obs.iter().map(|o| o.date).collect()
  }

  /// Sum of log-returns over the full sample.
  pub fn cumulative(&self) -> f64 {
    self.obs.iter().map(|o| o.value).sum()
  }
}

/// Convert close prices to log returns. The first observation per ticker has
/// no defined return and is dropped; non-positive closes are rejected.
pub fn log_returns(series: &PriceSeries) -> Result<ReturnSeries> {
  if series.len() < 2 {
    return Err(Error::InsufficientData(format!(
      "{}: need at least 2 closes for returns, got {}",
      series.ticker(),
      series.len()
    )));
  }

  let bars = series.bars();
  let mut obs = Vec::with_capacity(bars.len() - 1);

  for w in bars.windows(2) {
    if w[0].close <= 0.0 || w[1].close <= 0.0 {
      return Err(Error::MalformedInput(format!(
        "{}: non-positive close at {}",
        series.ticker(),
        w[1].date
      )));
    }
    obs.push(ReturnObs {
      date: w[1].date,
      value: (w[1].close / w[0].close).ln(),
    });
  }

  Ok(ReturnSeries::new(series.ticker(), obs))
}

/// Trailing right-aligned rolling standard deviation of returns.
///
/// The first `window - 1` observations have no defined value, so the output
/// starts at the date of the `window`-th return.
pub fn rolling_volatility(returns: &ReturnSeries, window: usize) -> Result<Vec<ReturnObs>> {
  if window < 2 {
    return Err(Error::MalformedInput(format!(
      "rolling window must be >= 2, got {window}"
    )));
  }
  if returns.len() < window {
    return Err(Error::InsufficientData(format!(
      "{}: {} returns < rolling window {window}",
      returns.ticker(),
      returns.len()
    )));
  }

  let obs = returns.obs();
  let mut out = Vec::with_capacity(obs.len() - window + 1);

  for end in window..=obs.len() {
    let slice = &obs[end - window..end];
    let mean = slice.iter().map(|o| o.value).sum::<f64>() / window as f64;
    let ss: f64 = slice.iter().map(|o| (o.value - mean).powi(2)).sum();
    out.push(ReturnObs {
      date: slice[window - 1].date,
      value: (ss / (window - 1) as f64).sqrt(),
    });
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::prices::PriceBar;

  fn series(closes: &[f64]) -> PriceSeries {
    let bars = closes
      .iter()
      .enumerate()
      .map(|(i, &c)| PriceBar {
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64),
        open: c,
        high: c,
        low: c,
        close: c,
        volume: 0.0,
      })
      .collect();
    PriceSeries::new("AAA", bars).unwrap()
  }

  #[test]
  fn log_returns_drop_first_observation() {
    let r = log_returns(&series(&[100.0, 110.0, 99.0])).unwrap();
    assert_eq!(r.len(), 2);
    assert!((r.values()[0] - (110.0f64 / 100.0).ln()).abs() < 1e-12);
    assert!((r.values()[1] - (99.0f64 / 110.0).ln()).abs() < 1e-12);
  }

  #[test]
  fn log_returns_reject_non_positive_close() {
    let err = log_returns(&series(&[100.0, 0.0, 99.0])).unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
  }

  #[test]
  fn rolling_volatility_is_right_aligned() {
    let r = log_returns(&series(&[100.0, 101.0, 102.0, 101.0, 103.0, 104.0])).unwrap();
    let vol = rolling_volatility(&r, 3).unwrap();

    // 5 returns, window 3 -> 3 defined values, first at the 3rd return date.
    assert_eq!(vol.len(), 3);
    assert_eq!(vol[0].date, r.obs()[2].date);
    assert!(vol.iter().all(|v| v.value >= 0.0));
  }

  #[test]
  fn rolling_volatility_needs_full_window() {
    let r = log_returns(&series(&[100.0, 101.0, 102.0])).unwrap();
    let err = rolling_volatility(&r, 30).unwrap_err();
    assert!(matches!(err, Error::InsufficientData(_)));
  }

  #[test]
  fn rolling_volatility_matches_sample_sd() {
    let r = ReturnSeries::new(
      "AAA",
      vec![
        ReturnObs {
          date: "2024-01-02".parse().unwrap(),
          value: 0.01,
        },
        ReturnObs {
          date: "2024-01-03".parse().unwrap(),
          value: -0.01,
        },
        ReturnObs {
          date: "2024-01-04".parse().unwrap(),
          value: 0.03,
        },
      ],
    );
    let vol = rolling_volatility(&r, 3).unwrap();
    let mean = 0.01f64;
    let expected =
      (((0.01 - mean).powi(2) + (-0.01 - mean).powi(2) + (0.03 - mean).powi(2)) / 2.0).sqrt();
    assert!((vol[0].value - expected).abs() < 1e-12);
  }
}

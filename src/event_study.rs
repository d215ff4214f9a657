//! # Event Study
//!
//! $$
//! r_{it} = \alpha_i + \beta_i r_{mt} + \varepsilon_{it}, \qquad
//! \mathrm{CAR}_{iT} = \sum_{t < T} \left( r_{it} - \hat r_{it} \right)
//! $$
//!
//! Market-model estimation over an estimation window and cumulative abnormal
//! returns over a disjoint, later event window. Ticker and market series are
//! inner-joined on date, so holiday mismatches shrink both the estimation
//! sample and the CAR series rather than misaligning them.

use chrono::NaiveDate;
use linreg::linear_regression;

use crate::data::returns::ReturnSeries;
use crate::error::Error;
use crate::error::Result;

/// Estimation and event window bounds, inclusive.
#[derive(Clone, Copy, Debug)]
pub struct EventStudyConfig {
  /// Estimation window `[t0, t1]`.
  pub estimation: (NaiveDate, NaiveDate),
  /// Event window `[t2, t3]`, strictly after the estimation window.
  pub event: (NaiveDate, NaiveDate),
  /// Minimum joined observations required to fit the market model.
  pub min_estimation_obs: usize,
}

impl EventStudyConfig {
  pub fn new(estimation: (NaiveDate, NaiveDate), event: (NaiveDate, NaiveDate)) -> Self {
    Self {
      estimation,
      event,
      min_estimation_obs: 30,
    }
  }

  fn validate(&self) -> Result<()> {
    let (t0, t1) = self.estimation;
    let (t2, t3) = self.event;
    if t1 < t0 || t3 < t2 {
      return Err(Error::MalformedInput(
        "event study windows must have start <= end".to_string(),
      ));
    }
    if t2 <= t1 {
      return Err(Error::MalformedInput(format!(
        "event window must start after the estimation window ends ({t1} >= {t2})"
      )));
    }
    Ok(())
  }
}

/// One event-window day: abnormal return and the CAR *entering* that day.
#[derive(Clone, Copy, Debug)]
pub struct CarPoint {
  pub date: NaiveDate,
  /// Actual minus market-model predicted return.
  pub abnormal: f64,
  /// Running sum of abnormal returns over the strictly preceding event days,
  /// so the first point carries exactly 0.
  pub car: f64,
}

/// Fitted market model and event-window CAR for one ticker.
#[derive(Clone, Debug)]
pub struct EventStudyResult {
  pub ticker: String,
  pub alpha: f64,
  pub beta: f64,
  /// Joined observations used in the estimation window.
  pub estimation_obs: usize,
  pub car: Vec<CarPoint>,
}

impl EventStudyResult {
  /// Total CAR over the event window, including the last day's abnormal return.
  pub fn total_car(&self) -> f64 {
    self.car.iter().map(|p| p.abnormal).sum()
  }
}

/// Inner-join two return series on date.
fn inner_join(ticker: &ReturnSeries, market: &ReturnSeries) -> Vec<(NaiveDate, f64, f64)> {
  let mut out = Vec::new();
  let (a, b) = (ticker.obs(), market.obs());
  let (mut i, mut j) = (0, 0);

  while i < a.len() && j < b.len() {
    match a[i].date.cmp(&b[j].date) {
      std::cmp::Ordering::Less => i += 1,
      std::cmp::Ordering::Greater => j += 1,
      std::cmp::Ordering::Equal => {
        out.push((a[i].date, a[i].value, b[j].value));
        i += 1;
        j += 1;
      }
    }
  }

  out
}

/// Fit the market model over the estimation window and accumulate abnormal
/// returns over the event window.
pub fn event_study(
  ticker: &ReturnSeries,
  market: &ReturnSeries,
  cfg: &EventStudyConfig,
) -> Result<EventStudyResult> {
  cfg.validate()?;

  let joined = inner_join(ticker, market);

  let est: Vec<(f64, f64)> = joined
    .iter()
    .filter(|(d, _, _)| *d >= cfg.estimation.0 && *d <= cfg.estimation.1)
    .map(|(_, r, m)| (*m, *r))
    .collect();

  if est.len() < cfg.min_estimation_obs {
    return Err(Error::InsufficientData(format!(
      "{}: {} joined estimation observations < required {}",
      ticker.ticker(),
      est.len(),
      cfg.min_estimation_obs
    )));
  }

  let xs: Vec<f64> = est.iter().map(|(m, _)| *m).collect();
  let ys: Vec<f64> = est.iter().map(|(_, r)| *r).collect();
  let (beta, alpha): (f64, f64) =
    linear_regression(&xs, &ys).map_err(|e| Error::ModelFit {
      model: "market-model-ols".to_string(),
      reason: format!("{e:?}"),
    })?;

  let mut car = Vec::new();
  let mut running = 0.0;
  for (date, r, m) in joined
    .iter()
    .filter(|(d, _, _)| *d >= cfg.event.0 && *d <= cfg.event.1)
  {
    let abnormal = r - (alpha + beta * m);
    // CAR entering the day: cumulative sum of the strictly preceding
    // abnormal returns, 0 by construction on the first event day.
    car.push(CarPoint {
      date: *date,
      abnormal,
      car: running,
    });
    running += abnormal;
  }

  Ok(EventStudyResult {
    ticker: ticker.ticker().to_string(),
    alpha,
    beta,
    estimation_obs: est.len(),
    car,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::returns::ReturnObs;

  fn date(i: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i)
  }

  fn series(ticker: &str, values: &[f64]) -> ReturnSeries {
    ReturnSeries::new(
      ticker,
      values
        .iter()
        .enumerate()
        .map(|(i, &v)| ReturnObs {
          date: date(i as u64),
          value: v,
        })
        .collect(),
    )
  }

  fn config(est_end: u64, ev_start: u64, ev_end: u64) -> EventStudyConfig {
    let mut cfg = EventStudyConfig::new((date(0), date(est_end)), (date(ev_start), date(ev_end)));
    cfg.min_estimation_obs = 5;
    cfg
  }

  #[test]
  fn recovers_alpha_and_beta_exactly() {
    // r = 0.001 + 1.5 m with no noise.
    let market: Vec<f64> = (0..40).map(|i| (i as f64 - 20.0) * 0.001).collect();
    let ticker: Vec<f64> = market.iter().map(|m| 0.001 + 1.5 * m).collect();

    let res = event_study(
      &series("AAA", &ticker),
      &series("MKT", &market),
      &config(29, 30, 39),
    )
    .unwrap();

    assert!((res.alpha - 0.001).abs() < 1e-10);
    assert!((res.beta - 1.5).abs() < 1e-10);
    // Exact model: every abnormal return is 0.
    assert!(res.total_car().abs() < 1e-10);
  }

  #[test]
  fn car_starts_at_exactly_zero() {
    let market: Vec<f64> = (0..40).map(|i| (i as f64).sin() * 0.01).collect();
    let ticker: Vec<f64> = market.iter().map(|m| 0.002 + 0.8 * m + 0.003).collect();

    let res = event_study(
      &series("AAA", &ticker),
      &series("MKT", &market),
      &config(29, 30, 39),
    )
    .unwrap();

    assert_eq!(res.car[0].car, 0.0);
    // Second point carries exactly the first abnormal return.
    assert!((res.car[1].car - res.car[0].abnormal).abs() < 1e-15);
  }

  #[test]
  fn inner_join_drops_holiday_mismatches() {
    let ticker = ReturnSeries::new(
      "AAA",
      (0..40)
        .map(|i| ReturnObs {
          date: date(i),
          value: 0.01,
        })
        .collect(),
    );
    // Market is closed every 5th day.
    let market = ReturnSeries::new(
      "MKT",
      (0..40)
        .filter(|i| i % 5 != 0)
        .map(|i| ReturnObs {
          date: date(i),
          value: 0.005 * (i as f64 % 3.0 - 1.0),
        })
        .collect(),
    );

    let res = event_study(&ticker, &market, &config(29, 30, 39)).unwrap();
    // Days 30..=39 minus the two closed days 30 and 35.
    assert_eq!(res.car.len(), 8);
    assert!(res.estimation_obs < 30);
  }

  #[test]
  fn rejects_overlapping_windows() {
    let r = series("AAA", &[0.0; 40]);
    let m = series("MKT", &[0.0; 40]);
    let cfg = EventStudyConfig::new((date(0), date(30)), (date(30), date(39)));
    let err = event_study(&r, &m, &cfg).unwrap_err();
    assert!(matches!(err, Error::MalformedInput(_)));
  }

  #[test]
  fn requires_minimum_estimation_sample() {
    let r = series("AAA", &[0.01; 10]);
    let m = series("MKT", &[0.005; 10]);
    let cfg = config(5, 7, 9);
    let err = event_study(&r, &m, &cfg).unwrap_err();
    assert!(matches!(err, Error::InsufficientData(_)));
  }
}

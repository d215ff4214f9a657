//! # Panel
//!
//! $$
//! \hat\Sigma_{ij} = \frac{1}{n_{ij}-1}
//!   \sum_{t \in D_i \cap D_j} (r_{it}-\bar r_i)(r_{jt}-\bar r_j)
//! $$
//!
//! Date-aligned wide return matrix with per-cell missingness and
//! pairwise-complete covariance/correlation estimation. Moments are always
//! recomputed from scratch over the supplied sample; there is no incremental
//! update path.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use ndarray::Array2;

use crate::data::returns::ReturnSeries;
use crate::error::Error;
use crate::error::Result;

/// Minimum overlapping observations required to estimate a pairwise moment.
const MIN_OVERLAP: usize = 2;

/// Wide return matrix: dates x tickers, outer-joined on dates so holiday
/// mismatches show up as missing cells rather than silently shifting rows.
#[derive(Clone, Debug)]
pub struct ReturnPanel {
  dates: Vec<NaiveDate>,
  tickers: Vec<String>,
  // row-major dates x tickers
  values: Vec<Vec<Option<f64>>>,
}

impl ReturnPanel {
  /// Outer-join per-ticker return series on date.
  pub fn from_series(series: &[ReturnSeries]) -> Result<Self> {
    if series.is_empty() {
      return Err(Error::InsufficientData(
        "return panel needs at least one series".to_string(),
      ));
    }

    let tickers: Vec<String> = series.iter().map(|s| s.ticker().to_string()).collect();

    let mut date_set = BTreeSet::new();
    for s in series {
      for o in s.obs() {
        date_set.insert(o.date);
      }
    }
    let dates: Vec<NaiveDate> = date_set.into_iter().collect();

    let mut values = vec![vec![None; tickers.len()]; dates.len()];
    for (j, s) in series.iter().enumerate() {
      for o in s.obs() {
        let i = dates.binary_search(&o.date).expect("date from the union set");
        values[i][j] = Some(o.value);
      }
    }

    Ok(Self {
      dates,
      tickers,
      values,
    })
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn n_tickers(&self) -> usize {
    self.tickers.len()
  }

  pub fn n_dates(&self) -> usize {
    self.dates.len()
  }

  /// Column of one ticker across all panel dates.
  pub fn column(&self, j: usize) -> Vec<Option<f64>> {
    self.values.iter().map(|row| row[j]).collect()
  }

  /// Non-missing values of one ticker, in date order.
  pub fn column_dense(&self, j: usize) -> Vec<f64> {
    self.values.iter().filter_map(|row| row[j]).collect()
  }

  /// Mean daily return per ticker over its non-missing sample.
  pub fn mean_returns(&self) -> Vec<f64> {
    (0..self.n_tickers())
      .map(|j| {
        let col = self.column_dense(j);
        if col.is_empty() {
          0.0
        } else {
          col.iter().sum::<f64>() / col.len() as f64
        }
      })
      .collect()
  }

  /// Full-sample cumulative log return per ticker.
  pub fn cumulative_returns(&self) -> Vec<f64> {
    (0..self.n_tickers())
      .map(|j| self.column_dense(j).iter().sum())
      .collect()
  }

  /// Pairwise-complete covariance matrix over tickers.
  ///
  /// Each entry is estimated from the dates where both tickers are observed;
  /// a pair with fewer than two overlapping observations is an error rather
  /// than a silent NaN.
  pub fn pairwise_covariance(&self) -> Result<Array2<f64>> {
    let n = self.n_tickers();
    let mut cov = Array2::zeros((n, n));

    for i in 0..n {
      for j in i..n {
        let c = self.pairwise_moment(i, j)?.0;
        cov[(i, j)] = c;
        cov[(j, i)] = c;
      }
    }

    Ok(cov)
  }

  /// Pairwise-complete Pearson correlation matrix over tickers.
  pub fn pairwise_correlation(&self) -> Result<Array2<f64>> {
    let n = self.n_tickers();
    let mut corr = Array2::zeros((n, n));

    for i in 0..n {
      corr[(i, i)] = 1.0;
      for j in (i + 1)..n {
        let r = self.pairwise_moment(i, j)?.1;
        corr[(i, j)] = r;
        corr[(j, i)] = r;
      }
    }

    Ok(corr)
  }

  /// (covariance, correlation) for one ticker pair over overlapping dates.
  fn pairwise_moment(&self, i: usize, j: usize) -> Result<(f64, f64)> {
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for row in &self.values {
      if let (Some(x), Some(y)) = (row[i], row[j]) {
        xs.push(x);
        ys.push(y);
      }
    }

    let n = xs.len();
    if n < MIN_OVERLAP {
      return Err(Error::InsufficientData(format!(
        "{} / {}: only {n} overlapping return observations",
        self.tickers[i], self.tickers[j]
      )));
    }

    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for k in 0..n {
      let dx = xs[k] - mx;
      let dy = ys[k] - my;
      sxy += dx * dy;
      sxx += dx * dx;
      syy += dy * dy;
    }

    let cov = sxy / (n - 1) as f64;
    let denom = (sxx * syy).sqrt();
    let corr = if denom < 1e-15 {
      0.0
    } else {
      (sxy / denom).clamp(-1.0, 1.0)
    };

    Ok((cov, corr))
  }
}

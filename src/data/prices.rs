//! # Prices
//!
//! Validated OHLCV containers. A [`PriceSeries`] is immutable once built and
//! guarantees strictly increasing dates; duplicated or out-of-order rows are
//! rejected at construction instead of surfacing later as silent NaNs.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::Error;
use crate::error::Result;

/// One trading day of a single ticker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceBar {
  pub date: NaiveDate,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  pub close: f64,
  pub volume: f64,
}

/// Ordered daily bars for one ticker, one row per trading day.
#[derive(Clone, Debug)]
pub struct PriceSeries {
  ticker: String,
  bars: Vec<PriceBar>,
}

impl PriceSeries {
  /// Build a series, enforcing strictly increasing dates.
  pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self> {
    let ticker = ticker.into();

    for w in bars.windows(2) {
      if w[1].date <= w[0].date {
        return Err(Error::MalformedInput(format!(
          "{ticker}: dates must be strictly increasing, got {} after {}",
          w[1].date, w[0].date
        )));
      }
    }

    Ok(Self { ticker, bars })
  }

  pub fn ticker(&self) -> &str {
    &self.ticker
  }

  pub fn bars(&self) -> &[PriceBar] {
    &self.bars
  }

  pub fn len(&self) -> usize {
    self.bars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bars.is_empty()
  }

  /// Close prices in date order.
  pub fn closes(&self) -> Vec<f64> {
    self.bars.iter().map(|b| b.close).collect()
  }

  /// Dates in order.
  pub fn dates(&self) -> Vec<NaiveDate> {
    self.bars.iter().map(|b| b.date).collect()
  }
}

/// All loaded tickers, keyed by symbol.
#[derive(Clone, Debug, Default)]
pub struct PricePanel {
  series: BTreeMap<String, PriceSeries>,
}

impl PricePanel {
  /// Assemble a panel from per-ticker series. Duplicate symbols are rejected.
  pub fn new(series: Vec<PriceSeries>) -> Result<Self> {
    let mut map = BTreeMap::new();
    for s in series {
      let ticker = s.ticker().to_string();
      if map.insert(ticker.clone(), s).is_some() {
        return Err(Error::MalformedInput(format!(
          "duplicate ticker in panel: {ticker}"
        )));
      }
    }
    Ok(Self { series: map })
  }

  pub fn tickers(&self) -> Vec<String> {
    self.series.keys().cloned().collect()
  }

  pub fn get(&self, ticker: &str) -> Option<&PriceSeries> {
    self.series.get(ticker)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &PriceSeries)> {
    self.series.iter()
  }

  pub fn len(&self) -> usize {
    self.series.len()
  }

  pub fn is_empty(&self) -> bool {
    self.series.is_empty()
  }
}

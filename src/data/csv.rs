//! # Csv
//!
//! Loader for the wide daily OHLCV layout: one `Date` column followed by
//! ticker-prefixed groups (`AAPL_Open`, `AAPL_High`, ..., `AAPL_Volume`).
//! A row with an empty cell drops that date for the affected ticker only;
//! a structurally broken header or an unparsable non-empty cell aborts the
//! load with [`Error::MalformedInput`].

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use crate::data::prices::PriceBar;
use crate::data::prices::PricePanel;
use crate::data::prices::PriceSeries;
use crate::error::Error;
use crate::error::Result;

const FIELDS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// Column indices of one ticker's OHLCV group.
#[derive(Clone, Copy, Debug, Default)]
struct FieldIdx {
  open: Option<usize>,
  high: Option<usize>,
  low: Option<usize>,
  close: Option<usize>,
  volume: Option<usize>,
}

impl FieldIdx {
  fn set(&mut self, field: &str, idx: usize) {
    match field {
      "open" => self.open = Some(idx),
      "high" => self.high = Some(idx),
      "low" => self.low = Some(idx),
      "close" => self.close = Some(idx),
      "volume" => self.volume = Some(idx),
      _ => {}
    }
  }

  fn complete(&self) -> Option<[usize; 5]> {
    Some([
      self.open?,
      self.high?,
      self.low?,
      self.close?,
      self.volume?,
    ])
  }
}

/// Load a wide OHLCV CSV from disk.
pub fn load_wide_ohlcv(path: impl AsRef<Path>) -> Result<PricePanel> {
  let path = path.as_ref();
  let file = File::open(path)
    .map_err(|e| Error::MalformedInput(format!("{}: {e}", path.display())))?;
  parse_wide_ohlcv(file)
}

/// Parse a wide OHLCV CSV from any reader.
pub fn parse_wide_ohlcv<R: Read>(reader: R) -> Result<PricePanel> {
  let mut rdr = csv::Reader::from_reader(reader);

  let headers = rdr
    .headers()
    .map_err(|e| Error::MalformedInput(format!("csv header: {e}")))?
    .clone();

  if headers.is_empty() || !headers[0].eq_ignore_ascii_case("date") {
    return Err(Error::MalformedInput(
      "first column must be Date".to_string(),
    ));
  }

  // Map ticker -> column group from the remaining headers.
  let mut groups: BTreeMap<String, FieldIdx> = BTreeMap::new();
  for (idx, name) in headers.iter().enumerate().skip(1) {
    let Some((ticker, field)) = name.rsplit_once('_') else {
      return Err(Error::MalformedInput(format!(
        "column {name:?} is not of the form TICKER_Field"
      )));
    };
    let field = field.to_ascii_lowercase();
    if !FIELDS.contains(&field.as_str()) {
      return Err(Error::MalformedInput(format!(
        "column {name:?} has unknown field suffix {field:?}"
      )));
    }
    groups
      .entry(ticker.to_string())
      .or_default()
      .set(&field, idx);
  }

  let mut columns: BTreeMap<String, [usize; 5]> = BTreeMap::new();
  for (ticker, idx) in &groups {
    let Some(complete) = idx.complete() else {
      return Err(Error::MalformedInput(format!(
        "{ticker}: missing one of the required Open/High/Low/Close/Volume columns"
      )));
    };
    columns.insert(ticker.clone(), complete);
  }

  if columns.is_empty() {
    return Err(Error::MalformedInput(
      "no ticker column groups found".to_string(),
    ));
  }

  let mut bars: BTreeMap<String, Vec<PriceBar>> = columns
    .keys()
    .map(|t| (t.clone(), Vec::new()))
    .collect();

  for (line, record) in rdr.records().enumerate() {
    let record = record.map_err(|e| Error::MalformedInput(format!("csv row {line}: {e}")))?;

    let date_cell = record.get(0).unwrap_or("");
    let date: NaiveDate = date_cell.parse().map_err(|_| {
      Error::MalformedInput(format!("row {line}: unparsable date {date_cell:?}"))
    })?;

    for (ticker, idx) in &columns {
      let cells: Vec<&str> = idx.iter().map(|&i| record.get(i).unwrap_or("")).collect();

      // An empty group cell means the ticker did not trade that day.
      if cells.iter().any(|c| c.trim().is_empty()) {
        continue;
      }

      let mut parsed = [0.0f64; 5];
      for (k, cell) in cells.iter().enumerate() {
        parsed[k] = cell.trim().parse().map_err(|_| {
          Error::MalformedInput(format!(
            "row {line}, {ticker}: unparsable value {cell:?}"
          ))
        })?;
      }

      bars.get_mut(ticker).expect("ticker key exists").push(PriceBar {
        date,
        open: parsed[0],
        high: parsed[1],
        low: parsed[2],
        close: parsed[3],
        volume: parsed[4],
      });
    }
  }

  let mut series = Vec::with_capacity(bars.len());
  for (ticker, bars) in bars {
    series.push(PriceSeries::new(ticker, bars)?);
  }

  PricePanel::new(series)
}

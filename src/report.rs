//! # Report
//!
//! Plain-text tables over a finished [`AnalysisReport`]. Rendering is pure
//! formatting; every number shown here was computed upstream.

use prettytable::format;
use prettytable::row;
use prettytable::Row;
use prettytable::Table;

use crate::pipeline::AnalysisReport;

fn new_table(titles: Row) -> Table {
  let mut t = Table::new();
  t.set_format(*format::consts::FORMAT_BOX_CHARS);
  t.set_titles(titles);
  t
}

fn fmt(v: f64) -> String {
  format!("{v:.4}")
}

fn fmt_pct(v: f64) -> String {
  format!("{:.2}%", v * 100.0)
}

/// Ticker-by-ticker correlation matrix.
pub fn correlation_table(report: &AnalysisReport) -> Table {
  let mut titles = row![""];
  for t in &report.tickers {
    titles.add_cell(prettytable::Cell::new(t));
  }
  let mut table = new_table(titles);

  for (i, t) in report.tickers.iter().enumerate() {
    let mut r = row![t];
    for j in 0..report.tickers.len() {
      r.add_cell(prettytable::Cell::new(&fmt(report.correlation[(i, j)])));
    }
    table.add_row(r);
  }
  table
}

/// Eigenvalues and explained variance of the factor decomposition.
pub fn pca_table(report: &AnalysisReport) -> Table {
  let mut table = new_table(row!["component", "eigenvalue", "explained", "cumulative"]);
  let mut cum = 0.0;
  for (k, (ev, ex)) in report
    .pca
    .eigenvalues
    .iter()
    .zip(report.pca.explained_variance.iter())
    .enumerate()
  {
    cum += ex;
    table.add_row(row![
      format!("PC{}", k + 1),
      fmt(*ev),
      fmt_pct(*ex),
      fmt_pct(cum)
    ]);
  }
  table
}

/// Market-model parameters and total CAR per ticker.
pub fn event_study_table(report: &AnalysisReport) -> Table {
  let mut table = new_table(row!["ticker", "alpha", "beta", "obs", "total CAR"]);
  for res in &report.event_study {
    table.add_row(row![
      res.ticker,
      format!("{:.6}", res.alpha),
      fmt(res.beta),
      res.estimation_obs,
      fmt(res.total_car())
    ]);
  }
  table
}

/// Holdout accuracy and the selected model or blend per ticker.
pub fn forecast_table(report: &AnalysisReport) -> Table {
  let mut table = new_table(row![
    "ticker",
    "ar order",
    "models (MAPE)",
    "selected",
    "selected MAPE"
  ]);

  for (ticker, fc) in &report.forecasts {
    let models = fc
      .price_models
      .iter()
      .map(|m| format!("{} {}", m.label, fmt_pct(m.mape)))
      .collect::<Vec<_>>()
      .join(", ");

    let selected = match &fc.selection.choice {
      crate::forecast::SelectedForecast::Single { label } => label.clone(),
      crate::forecast::SelectedForecast::Blend { labels, weights } => format!(
        "blend {} {:.2} / {} {:.2}",
        labels.0, weights.0, labels.1, weights.1
      ),
    };

    table.add_row(row![
      ticker,
      fc.ar_order,
      models,
      selected,
      fmt_pct(fc.selection.mape)
    ]);
  }
  table
}

/// Conditional volatility and tail-risk per ticker.
pub fn risk_table(report: &AnalysisReport) -> Table {
  let mut table = new_table(row!["ticker", "sigma", "nu", "VaR 95", "ES 95"]);
  for (ticker, r) in &report.risk {
    table.add_row(row![
      ticker,
      fmt_pct(r.sigma),
      format!("{:.1}", r.nu),
      fmt_pct(r.var_95),
      fmt_pct(r.es_95)
    ]);
  }
  table
}

/// One row per scheme, one weight column per ticker.
pub fn weights_table(report: &AnalysisReport) -> Table {
  let Some(first) = report.weights.first() else {
    return new_table(row!["scheme"]);
  };

  let mut titles = row!["scheme"];
  for t in &first.tickers {
    titles.add_cell(prettytable::Cell::new(t));
  }
  let mut table = new_table(titles);

  for wv in &report.weights {
    let mut r = row![wv.scheme.to_string()];
    for w in &wv.weights {
      r.add_cell(prettytable::Cell::new(&fmt_pct(*w)));
    }
    table.add_row(r);
  }
  table
}

/// Simulated return distribution per (scheme, horizon).
pub fn simulation_table(report: &AnalysisReport) -> Table {
  let mut table = new_table(row!["scheme", "horizon", "mean", "sd", "p5", "p95"]);
  for (scheme, s) in &report.simulations {
    table.add_row(row![
      scheme.to_string(),
      s.horizon,
      fmt_pct(s.mean),
      fmt_pct(s.std_dev),
      fmt_pct(s.p5),
      fmt_pct(s.p95)
    ]);
  }
  table
}

/// Everything that was dropped along the way, with reasons.
pub fn skipped_table(report: &AnalysisReport) -> Table {
  let mut table = new_table(row!["what", "stage", "reason"]);
  for s in &report.skipped_tickers {
    table.add_row(row![s.ticker, s.stage, s.reason]);
  }
  for s in &report.skipped_strategies {
    let what = match s.horizon {
      Some(h) => format!("{} @ {h}d", s.scheme),
      None => s.scheme.clone(),
    };
    table.add_row(row![what, "portfolio", s.reason]);
  }
  table
}

/// Render the full report as one text document.
pub fn render(report: &AnalysisReport) -> String {
  let mut out = String::new();
  let mut section = |title: &str, table: Table| {
    out.push_str(title);
    out.push('\n');
    out.push_str(&table.to_string());
    out.push('\n');
  };

  section("Return correlation", correlation_table(report));
  section("Principal components", pca_table(report));
  if !report.event_study.is_empty() {
    section("Event study", event_study_table(report));
  }
  section("Forecast selection", forecast_table(report));
  section("Tail risk (GARCH(1,1)-t)", risk_table(report));
  section("Portfolio weights", weights_table(report));
  section("Simulated horizons", simulation_table(report));
  if !report.skipped_tickers.is_empty() || !report.skipped_strategies.is_empty() {
    section("Skipped", skipped_table(report));
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::forecast::ensemble::EnsembleSelection;
  use crate::forecast::ensemble::ModelEval;
  use crate::forecast::SelectedForecast;
  use crate::pipeline::TickerForecastReport;
  use crate::portfolio::simulation::SimulationSummary;
  use crate::portfolio::weights::WeightScheme;
  use crate::portfolio::weights::WeightVector;
  use crate::risk::measures::RiskEstimate;
  use ndarray::arr2;
  use std::collections::BTreeMap;

  fn tiny_report() -> AnalysisReport {
    let mut forecasts = BTreeMap::new();
    forecasts.insert(
      "AAA".to_string(),
      TickerForecastReport {
        ticker: "AAA".to_string(),
        ar_order: 1,
        return_forecast: vec![0.001; 5],
        price_models: vec![ModelEval {
          label: "holt-ets".to_string(),
          holdout_forecast: vec![100.0; 5],
          mape: 0.02,
          rmse: 2.0,
        }],
        selection: EnsembleSelection {
          choice: SelectedForecast::Single {
            label: "holt-ets".to_string(),
          },
          holdout_forecast: vec![100.0; 5],
          mape: 0.02,
        },
      },
    );

    let mut risk = BTreeMap::new();
    risk.insert(
      "AAA".to_string(),
      RiskEstimate {
        sigma: 0.015,
        nu: 7.2,
        var_95: 0.024,
        es_95: 0.031,
      },
    );

    AnalysisReport {
      tickers: vec!["AAA".to_string(), "BBB".to_string()],
      correlation: arr2(&[[1.0, 0.4], [0.4, 1.0]]),
      covariance: arr2(&[[0.0004, 0.0001], [0.0001, 0.0003]]),
      pca: crate::factors::pca::PcaResult {
        tickers: vec!["AAA".to_string(), "BBB".to_string()],
        eigenvalues: vec![1.4, 0.6],
        explained_variance: vec![0.7, 0.3],
        loadings: vec![vec![0.7, 0.7], vec![0.7, -0.7]],
      },
      rolling_volatility: BTreeMap::new(),
      event_study: Vec::new(),
      forecasts,
      risk,
      weights: vec![WeightVector {
        scheme: WeightScheme::Equal,
        tickers: vec!["AAA".to_string(), "BBB".to_string()],
        weights: vec![0.5, 0.5],
      }],
      simulations: vec![(
        WeightScheme::Equal,
        SimulationSummary {
          horizon: 21,
          mean: 0.01,
          std_dev: 0.05,
          p5: -0.07,
          p95: 0.09,
        },
      )],
      skipped_tickers: Vec::new(),
      skipped_strategies: Vec::new(),
    }
  }

  #[test]
  fn render_includes_every_section_title() {
    let text = render(&tiny_report());
    for title in [
      "Return correlation",
      "Principal components",
      "Forecast selection",
      "Tail risk",
      "Portfolio weights",
      "Simulated horizons",
    ] {
      assert!(text.contains(title), "missing section {title}");
    }
    // No skips, no event study -> those sections are absent.
    assert!(!text.contains("Skipped"));
    assert!(!text.contains("Event study"));
  }

  #[test]
  fn correlation_table_is_square_with_header_column() {
    let t = correlation_table(&tiny_report());
    assert_eq!(t.len(), 2);
  }

  #[test]
  fn pca_table_accumulates_to_full_variance() {
    let text = pca_table(&tiny_report()).to_string();
    assert!(text.contains("100.00%"));
  }

  #[test]
  fn skipped_strategies_show_the_horizon() {
    let mut report = tiny_report();
    report.skipped_strategies.push(crate::pipeline::SkippedStrategy {
      scheme: "mean-variance".to_string(),
      horizon: Some(63),
      reason: "infeasible cap".to_string(),
    });
    let text = skipped_table(&report).to_string();
    assert!(text.contains("mean-variance @ 63d"));
  }
}

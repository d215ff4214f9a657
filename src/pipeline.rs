//! # Pipeline
//!
//! $$
//! \text{prices} \to \text{returns} \to
//! \{\rho/\mathrm{PCA},\ \mathrm{CAR},\ \hat y,\ \mathrm{VaR}\}
//! \to \mathbf{w} \to \text{simulation}
//! $$
//!
//! One-shot batch orchestration. Every intermediate is an explicit value
//! threaded stage to stage; nothing is shared mutably. Per-ticker fits are
//! independent and run in parallel; a ticker that fails validation or a fit
//! is recorded and skipped without aborting the run, and an infeasible
//! strategy/horizon pair is likewise reported rather than fatal.

use std::collections::BTreeMap;

use ndarray::Array2;
use rayon::prelude::*;
use tracing::info;
use tracing::warn;

use crate::data::panel::ReturnPanel;
use crate::data::prices::PricePanel;
use crate::data::returns::log_returns;
use crate::data::returns::rolling_volatility;
use crate::data::returns::ReturnObs;
use crate::data::returns::ReturnSeries;
use crate::error::Error;
use crate::error::Result;
use crate::event_study::event_study;
use crate::event_study::EventStudyConfig;
use crate::event_study::EventStudyResult;
use crate::factors::pca::principal_components;
use crate::factors::pca::PcaResult;
use crate::forecast::arima::AutoAr;
use crate::forecast::ensemble;
use crate::forecast::ensemble::EnsembleSelection;
use crate::forecast::ensemble::ModelEval;
use crate::forecast::ets::HoltEts;
use crate::forecast::trend::TrendDecomposition;
use crate::forecast::FittedForecaster;
use crate::forecast::ForecastConfig;
use crate::forecast::Forecaster;
use crate::portfolio::simulation::simulate_portfolio;
use crate::portfolio::simulation::SimulationConfig;
use crate::portfolio::simulation::SimulationSummary;
use crate::portfolio::weights::equal_weights;
use crate::portfolio::weights::inverse_volatility_weights;
use crate::portfolio::weights::mean_variance_weights;
use crate::portfolio::weights::return_proportional_weights;
use crate::portfolio::weights::MeanVarianceConfig;
use crate::portfolio::weights::WeightScheme;
use crate::portfolio::weights::WeightVector;
use crate::risk::garch::fit_garch11_t;
use crate::risk::garch::GarchConfig;
use crate::risk::measures::RiskEstimate;

/// Full pipeline configuration; every stage knob in one place.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
  /// Rolling volatility window in trading days.
  pub rolling_window: usize,
  pub forecast: ForecastConfig,
  pub garch: GarchConfig,
  /// Lower-tail probability for VaR/ES.
  pub tail_alpha: f64,
  pub mean_variance: MeanVarianceConfig,
  pub simulation: SimulationConfig,
  /// Market-model windows; the event study runs only when set.
  pub event_study: Option<EventStudyConfig>,
  /// Market-proxy ticker. Used for the event study and kept out of the
  /// investable universe.
  pub market_ticker: Option<String>,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      rolling_window: 30,
      forecast: ForecastConfig::default(),
      garch: GarchConfig::default(),
      tail_alpha: 0.05,
      mean_variance: MeanVarianceConfig::default(),
      simulation: SimulationConfig::default(),
      event_study: None,
      market_ticker: None,
    }
  }
}

/// Per-ticker forecast stage output.
#[derive(Clone, Debug)]
pub struct TickerForecastReport {
  pub ticker: String,
  /// Selected AR order for the return-level model.
  pub ar_order: usize,
  /// Point forecast of log returns over the configured horizon.
  pub return_forecast: Vec<f64>,
  /// Holdout evaluations of the price-level models.
  pub price_models: Vec<ModelEval>,
  /// Outcome of the per-ticker blend-or-single policy.
  pub selection: EnsembleSelection,
}

/// A ticker dropped at some stage, with the reason.
#[derive(Clone, Debug)]
pub struct SkippedTicker {
  pub ticker: String,
  pub stage: &'static str,
  pub reason: String,
}

/// A strategy (or strategy/horizon pair) that could not be produced.
#[derive(Clone, Debug)]
pub struct SkippedStrategy {
  pub scheme: String,
  pub horizon: Option<usize>,
  pub reason: String,
}

/// Everything the run computed, exposed as plain values.
#[derive(Debug)]
pub struct AnalysisReport {
  /// Tickers that survived return preprocessing, in panel order.
  pub tickers: Vec<String>,
  pub correlation: Array2<f64>,
  pub covariance: Array2<f64>,
  pub pca: PcaResult,
  pub rolling_volatility: BTreeMap<String, Vec<ReturnObs>>,
  pub event_study: Vec<EventStudyResult>,
  pub forecasts: BTreeMap<String, TickerForecastReport>,
  pub risk: BTreeMap<String, RiskEstimate>,
  pub weights: Vec<WeightVector>,
  /// One summary per produced (scheme, horizon) pair.
  pub simulations: Vec<(WeightScheme, SimulationSummary)>,
  pub skipped_tickers: Vec<SkippedTicker>,
  pub skipped_strategies: Vec<SkippedStrategy>,
}

/// Batch driver owning the configuration.
#[derive(Clone, Debug, Default)]
pub struct AnalysisPipeline {
  config: PipelineConfig,
}

struct TickerInputs {
  ticker: String,
  returns: ReturnSeries,
  closes: Vec<f64>,
}

struct TickerFits {
  ticker: String,
  forecast: Result<TickerForecastReport>,
  risk: Result<RiskEstimate>,
}

impl AnalysisPipeline {
  pub fn new(config: PipelineConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &PipelineConfig {
    &self.config
  }

  /// Run every stage over the supplied panel.
  pub fn run(&self, panel: &PricePanel) -> Result<AnalysisReport> {
    let cfg = &self.config;
    let mut skipped_tickers = Vec::new();

    // Stage 1: returns + rolling volatility, dropping tickers that cannot
    // carry the rolling window.
    let mut inputs: Vec<TickerInputs> = Vec::new();
    let mut rolling = BTreeMap::new();
    let mut market_returns: Option<ReturnSeries> = None;

    for (ticker, series) in panel.iter() {
      let returns = match log_returns(series) {
        Ok(r) => r,
        Err(e) => {
          warn!(ticker = %ticker, error = %e, "dropping ticker at return stage");
          skipped_tickers.push(SkippedTicker {
            ticker: ticker.clone(),
            stage: "returns",
            reason: e.to_string(),
          });
          continue;
        }
      };

      if cfg.market_ticker.as_deref() == Some(ticker.as_str()) {
        market_returns = Some(returns);
        continue;
      }

      match rolling_volatility(&returns, cfg.rolling_window) {
        Ok(vol) => {
          rolling.insert(ticker.clone(), vol);
        }
        Err(e) => {
          warn!(ticker = %ticker, error = %e, "dropping ticker at rolling-volatility stage");
          skipped_tickers.push(SkippedTicker {
            ticker: ticker.clone(),
            stage: "rolling-volatility",
            reason: e.to_string(),
          });
          continue;
        }
      }

      inputs.push(TickerInputs {
        ticker: ticker.clone(),
        closes: series.closes(),
        returns,
      });
    }

    if inputs.is_empty() {
      return Err(Error::InsufficientData(
        "no ticker survived return preprocessing".to_string(),
      ));
    }

    // Stage 2: panel moments and factor structure.
    let return_series: Vec<ReturnSeries> = inputs.iter().map(|i| i.returns.clone()).collect();
    let return_panel = ReturnPanel::from_series(&return_series)?;
    let correlation = return_panel.pairwise_correlation()?;
    let covariance = return_panel.pairwise_covariance()?;
    let pca = principal_components(&return_panel)?;

    // Stage 3: event study against the market proxy, when configured.
    let event_results =
      self.run_event_study(&inputs, market_returns.as_ref(), &mut skipped_tickers)?;

    // Stage 4: per-ticker fits, embarrassingly parallel.
    let fits: Vec<TickerFits> = inputs
      .par_iter()
      .map(|input| TickerFits {
        ticker: input.ticker.clone(),
        forecast: self.fit_forecasts(input),
        risk: self.fit_risk(input),
      })
      .collect();

    let mut forecasts = BTreeMap::new();
    let mut risk = BTreeMap::new();
    for fit in fits {
      match fit.forecast {
        Ok(report) => {
          forecasts.insert(fit.ticker.clone(), report);
        }
        Err(e) => {
          warn!(ticker = %fit.ticker, error = %e, "forecast stage failed");
          skipped_tickers.push(SkippedTicker {
            ticker: fit.ticker.clone(),
            stage: "forecast",
            reason: e.to_string(),
          });
        }
      }
      match fit.risk {
        Ok(estimate) => {
          risk.insert(fit.ticker.clone(), estimate);
        }
        Err(e) => {
          warn!(ticker = %fit.ticker, error = %e, "risk stage failed");
          skipped_tickers.push(SkippedTicker {
            ticker: fit.ticker.clone(),
            stage: "risk",
            reason: e.to_string(),
          });
        }
      }
    }

    // Stage 5: weights over the tickers with a usable risk estimate, so the
    // four schemes share one universe.
    let universe: Vec<usize> = inputs
      .iter()
      .enumerate()
      .filter(|(_, i)| risk.contains_key(&i.ticker))
      .map(|(idx, _)| idx)
      .collect();

    let mut weights = Vec::new();
    let mut simulations = Vec::new();
    let mut skipped_strategies = Vec::new();

    if universe.is_empty() {
      skipped_strategies.push(SkippedStrategy {
        scheme: "all".to_string(),
        horizon: None,
        reason: "no ticker has a risk estimate".to_string(),
      });
    } else {
      let names: Vec<String> = universe.iter().map(|&i| inputs[i].ticker.clone()).collect();
      let sigmas: Vec<f64> = names.iter().map(|t| risk[t].sigma).collect();
      let cumulative: Vec<f64> = universe
        .iter()
        .map(|&i| inputs[i].returns.cumulative())
        .collect();
      let mu: Vec<f64> = {
        let means = return_panel.mean_returns();
        universe.iter().map(|&i| means[i]).collect()
      };
      let sub_cov = submatrix(&covariance, &universe);

      let candidates: Vec<(WeightScheme, Result<Vec<f64>>)> = vec![
        (WeightScheme::Equal, equal_weights(names.len())),
        (
          WeightScheme::InverseVolatility,
          inverse_volatility_weights(&sigmas),
        ),
        (
          WeightScheme::ReturnProportional,
          return_proportional_weights(&cumulative),
        ),
        (
          WeightScheme::MeanVariance,
          mean_variance_weights(&mu, &sub_cov, &cfg.mean_variance),
        ),
      ];

      for (scheme, outcome) in candidates {
        match outcome {
          Ok(w) => weights.push(WeightVector {
            scheme,
            tickers: names.clone(),
            weights: w,
          }),
          Err(e) => {
            warn!(scheme = %scheme, error = %e, "weight scheme failed");
            skipped_strategies.push(SkippedStrategy {
              scheme: scheme.to_string(),
              horizon: None,
              reason: e.to_string(),
            });
          }
        }
      }

      // Stage 6: Monte Carlo per (scheme, horizon). All schemes share the
      // seed, so they are compared on identical draws.
      for wv in &weights {
        for &horizon in &cfg.simulation.horizons {
          match simulate_portfolio(&wv.weights, &sub_cov, horizon, &cfg.simulation) {
            Ok(summary) => simulations.push((wv.scheme, summary)),
            Err(e) => {
              warn!(scheme = %wv.scheme, horizon, error = %e, "simulation failed");
              skipped_strategies.push(SkippedStrategy {
                scheme: wv.scheme.to_string(),
                horizon: Some(horizon),
                reason: e.to_string(),
              });
            }
          }
        }
      }
    }

    info!(
      tickers = inputs.len(),
      weights = weights.len(),
      simulations = simulations.len(),
      skipped = skipped_tickers.len(),
      "pipeline run complete"
    );

    Ok(AnalysisReport {
      tickers: inputs.iter().map(|i| i.ticker.clone()).collect(),
      correlation,
      covariance,
      pca,
      rolling_volatility: rolling,
      event_study: event_results,
      forecasts,
      risk,
      weights,
      simulations,
      skipped_tickers,
      skipped_strategies,
    })
  }

  fn run_event_study(
    &self,
    inputs: &[TickerInputs],
    market: Option<&ReturnSeries>,
    skipped: &mut Vec<SkippedTicker>,
  ) -> Result<Vec<EventStudyResult>> {
    let Some(cfg) = &self.config.event_study else {
      return Ok(Vec::new());
    };

    let market = market.ok_or_else(|| {
      Error::MalformedInput(format!(
        "event study configured but market ticker {:?} is not in the panel",
        self.config.market_ticker
      ))
    })?;

    let mut out = Vec::new();
    for input in inputs {
      match event_study(&input.returns, market, cfg) {
        Ok(res) => out.push(res),
        Err(e) => {
          warn!(ticker = %input.ticker, error = %e, "event study failed");
          skipped.push(SkippedTicker {
            ticker: input.ticker.clone(),
            stage: "event-study",
            reason: e.to_string(),
          });
        }
      }
    }

    Ok(out)
  }

  fn fit_forecasts(&self, input: &TickerInputs) -> Result<TickerForecastReport> {
    let fcfg = &self.config.forecast;

    let ar = AutoAr {
      max_order: fcfg.max_ar_order,
      ..AutoAr::default()
    };
    let fitted_ar = ar.fit_ar(&input.returns.values())?;
    let return_forecast = fitted_ar.forecast(fcfg.return_horizon);

    let ets = HoltEts::default();
    let trend = TrendDecomposition::default();
    let mut price_models = Vec::new();
    for forecaster in [&ets as &dyn Forecaster, &trend] {
      match ensemble::evaluate(forecaster, &input.closes, fcfg.holdout) {
        Ok(eval) => price_models.push(eval),
        Err(e) => {
          warn!(ticker = %input.ticker, model = forecaster.label(), error = %e, "price model failed");
        }
      }
    }

    let (_, holdout_actual) = ensemble::holdout_split(&input.closes, fcfg.holdout)?;
    let selection = ensemble::select(&price_models, holdout_actual)?;

    Ok(TickerForecastReport {
      ticker: input.ticker.clone(),
      ar_order: fitted_ar.order,
      return_forecast,
      price_models,
      selection,
    })
  }

  fn fit_risk(&self, input: &TickerInputs) -> Result<RiskEstimate> {
    let fit = fit_garch11_t(&input.returns.values(), &self.config.garch)?;
    RiskEstimate::from_fit(&fit, self.config.tail_alpha)
  }
}

/// Symmetric submatrix selection.
fn submatrix(m: &Array2<f64>, idx: &[usize]) -> Array2<f64> {
  let k = idx.len();
  Array2::from_shape_fn((k, k), |(a, b)| m[(idx[a], idx[b])])
}

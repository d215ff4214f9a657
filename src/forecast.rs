//! # Forecast
//!
//! $$
//! \hat y_{t+h} = f_\theta(y_1,\dots,y_t)
//! $$
//!
//! Univariate forecasters behind a narrow fit/forecast seam, holdout accuracy
//! scoring and inverse-error ensemble blending. Numerical internals (order
//! search, smoothing-parameter search, trend regression) stay behind the
//! [`Forecaster`] trait so callers only see point forecasts.

pub mod accuracy;
pub mod arima;
pub mod ensemble;
pub mod ets;
pub mod trend;

pub use accuracy::mape;
pub use accuracy::rmse;
pub use arima::AutoAr;
pub use ensemble::inverse_mape_weights;
pub use ensemble::EnsembleSelection;
pub use ensemble::ModelEval;
pub use ensemble::SelectedForecast;
pub use ets::HoltEts;
pub use trend::TrendDecomposition;

use crate::error::Result;

/// A fitted model able to produce point forecasts.
pub trait FittedForecaster: Send {
  /// Point forecast for the next `horizon` steps.
  fn forecast(&self, horizon: usize) -> Vec<f64>;
}

/// A forecasting procedure that can be fitted to a univariate series.
pub trait Forecaster: Sync {
  /// Short model label used in reports and error messages.
  fn label(&self) -> &'static str;

  /// Fit to the full supplied series.
  fn fit(&self, series: &[f64]) -> Result<Box<dyn FittedForecaster>>;
}

/// Knobs for the per-ticker forecast stage.
#[derive(Clone, Copy, Debug)]
pub struct ForecastConfig {
  /// Forecast horizon for the return-level model, in trading days.
  pub return_horizon: usize,
  /// Holdout length for price-level model evaluation, in trading days.
  pub holdout: usize,
  /// Largest autoregressive order considered by the order search.
  pub max_ar_order: usize,
}

impl Default for ForecastConfig {
  fn default() -> Self {
    Self {
      return_horizon: 20,
      holdout: 60,
      max_ar_order: 5,
    }
  }
}

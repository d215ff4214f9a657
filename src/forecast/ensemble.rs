//! # Ensemble
//!
//! $$
//! w_i = \frac{1/\mathrm{MAPE}_i}{\sum_j 1/\mathrm{MAPE}_j}
//! $$
//!
//! Holdout evaluation and inverse-error blending. The blend is a policy, not
//! an automatism: per ticker it is kept only when it empirically beats the
//! best single model on the holdout, otherwise the single best model wins.

use crate::error::Error;
use crate::error::Result;
use crate::forecast::accuracy::mape;
use crate::forecast::accuracy::rmse;
use crate::forecast::Forecaster;

/// Holdout evaluation of one fitted model.
#[derive(Clone, Debug)]
pub struct ModelEval {
  pub label: String,
  /// Point forecast over the holdout span.
  pub holdout_forecast: Vec<f64>,
  pub mape: f64,
  pub rmse: f64,
}

/// Which forecast the per-ticker policy settled on.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectedForecast {
  /// Single best model by holdout MAPE.
  Single { label: String },
  /// Inverse-MAPE blend of the two best models.
  Blend {
    labels: (String, String),
    weights: (f64, f64),
  },
}

/// Outcome of the selection policy for one ticker.
#[derive(Clone, Debug)]
pub struct EnsembleSelection {
  pub choice: SelectedForecast,
  /// Holdout-span forecast of the chosen model or blend.
  pub holdout_forecast: Vec<f64>,
  pub mape: f64,
}

/// Split a series into `(train, holdout)` with a trailing holdout.
pub fn holdout_split(series: &[f64], holdout: usize) -> Result<(&[f64], &[f64])> {
  if holdout == 0 || series.len() <= holdout {
    return Err(Error::InsufficientData(format!(
      "holdout split: {} observations cannot carry a {holdout}-step holdout",
      series.len()
    )));
  }
  Ok(series.split_at(series.len() - holdout))
}

/// Fit on the training span and score the forecast against the holdout.
pub fn evaluate(
  forecaster: &dyn Forecaster,
  series: &[f64],
  holdout: usize,
) -> Result<ModelEval> {
  let (train, test) = holdout_split(series, holdout)?;
  let fitted = forecaster.fit(train)?;
  let forecast = fitted.forecast(holdout);

  Ok(ModelEval {
    label: forecaster.label().to_string(),
    mape: mape(test, &forecast),
    rmse: rmse(test, &forecast),
    holdout_forecast: forecast,
  })
}

/// Normalized inverse-MAPE weights for a two-model blend.
///
/// Both weights land in `[0, 1]` and sum to 1. Non-finite or non-positive
/// errors make the weighting undefined.
pub fn inverse_mape_weights(mape_a: f64, mape_b: f64) -> Result<(f64, f64)> {
  if !(mape_a.is_finite() && mape_b.is_finite()) || mape_a <= 0.0 || mape_b <= 0.0 {
    return Err(Error::ModelFit {
      model: "ensemble".to_string(),
      reason: format!("inverse-MAPE weights need positive finite errors, got {mape_a}, {mape_b}"),
    });
  }

  let (ia, ib) = (1.0 / mape_a, 1.0 / mape_b);
  let total = ia + ib;
  Ok((ia / total, ib / total))
}

/// Apply the per-ticker selection policy to a set of holdout evaluations.
///
/// The two lowest-MAPE models are blended with inverse-MAPE weights; the
/// blend is selected only when its holdout MAPE is strictly below the best
/// single model's.
pub fn select(evals: &[ModelEval], holdout_actual: &[f64]) -> Result<EnsembleSelection> {
  let mut ranked: Vec<&ModelEval> = evals.iter().filter(|e| e.mape.is_finite()).collect();
  if ranked.is_empty() {
    return Err(Error::ModelFit {
      model: "ensemble".to_string(),
      reason: "no model produced a finite holdout MAPE".to_string(),
    });
  }
  ranked.sort_by(|a, b| a.mape.partial_cmp(&b.mape).unwrap_or(std::cmp::Ordering::Equal));

  let best = ranked[0];
  let single = EnsembleSelection {
    choice: SelectedForecast::Single {
      label: best.label.clone(),
    },
    holdout_forecast: best.holdout_forecast.clone(),
    mape: best.mape,
  };

  if ranked.len() < 2 || best.mape <= 0.0 || ranked[1].mape <= 0.0 {
    return Ok(single);
  }

  let second = ranked[1];
  let (wa, wb) = inverse_mape_weights(best.mape, second.mape)?;
  let blended: Vec<f64> = best
    .holdout_forecast
    .iter()
    .zip(second.holdout_forecast.iter())
    .map(|(a, b)| wa * a + wb * b)
    .collect();
  let blended_mape = mape(holdout_actual, &blended);

  if blended_mape.is_finite() && blended_mape < best.mape {
    Ok(EnsembleSelection {
      choice: SelectedForecast::Blend {
        labels: (best.label.clone(), second.label.clone()),
        weights: (wa, wb),
      },
      holdout_forecast: blended,
      mape: blended_mape,
    })
  } else {
    Ok(single)
  }
}

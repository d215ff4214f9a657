//! # Error
//!
//! Failure taxonomy shared by every pipeline stage.
//!
//! Per-ticker failures (validation, fit) abort only the affected ticker;
//! per-strategy failures (infeasible optimization) abort only the affected
//! strategy/horizon pair. The pipeline records both and keeps going.

use thiserror::Error;

/// Errors produced by the analysis pipeline.
#[derive(Debug, Error)]
pub enum Error {
  /// Input data violates a structural requirement: non-increasing or
  /// duplicated dates, missing required columns, unparsable cells, or a
  /// covariance matrix that does not admit multivariate sampling.
  #[error("malformed input: {0}")]
  MalformedInput(String),

  /// A series is too short for the requested window or fit.
  #[error("insufficient data: {0}")]
  InsufficientData(String),

  /// A volatility or forecasting fit failed to converge or produced a
  /// non-finite objective.
  #[error("model fit failed for {model}: {reason}")]
  ModelFit {
    /// Model label, e.g. `garch(1,1)-t` or `ar(p)`.
    model: String,
    /// Human-readable cause.
    reason: String,
  },

  /// A fitted Student-t shape parameter came back with `nu <= 2`, for which
  /// the variance-scaled VaR/ES formulas are undefined.
  #[error("invalid distribution parameter: fitted nu = {nu}, require nu > 2")]
  InvalidDistributionParameter {
    /// Fitted degrees-of-freedom.
    nu: f64,
  },

  /// Raw weight scores sum to a non-positive number, so normalization would
  /// emit degenerate or negative weights.
  #[error("degenerate weights for scheme {scheme}: raw score sum = {raw_sum}")]
  DegenerateWeight {
    /// Weight scheme label.
    scheme: String,
    /// Sum of the raw (pre-normalization) scores.
    raw_sum: f64,
  },

  /// The mean-variance constraint set is empty, e.g. `max_w * n < 1`.
  #[error("infeasible constraints: {0}")]
  InfeasibleConstraint(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

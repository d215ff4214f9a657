//! # Measures
//!
//! $$
//! \mathrm{VaR}_{1-\alpha} = -\sigma \sqrt{\tfrac{\nu-2}{\nu}}\, q_\alpha,
//! \qquad
//! \mathrm{ES}_{1-\alpha} = -\sigma \sqrt{\tfrac{\nu-2}{\nu}}\,
//!   \frac{f_\nu(q_\alpha)}{\alpha\,(1-2/\nu)}
//! $$
//!
//! Tail-risk quantiles from a fitted Student-t volatility model. The
//! `sqrt((nu-2)/nu)` factor rescales the raw t quantile to the unit-variance
//! standardized residual, which is only defined for `nu > 2`; a fit that
//! returns a smaller shape is rejected outright instead of propagating NaN.

use statrs::distribution::Continuous;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::StudentsT;

use crate::error::Error;
use crate::error::Result;
use crate::risk::garch::GarchFit;

/// Per-ticker next-period tail-risk estimate.
#[derive(Clone, Copy, Debug)]
pub struct RiskEstimate {
  /// One-step-ahead conditional volatility.
  pub sigma: f64,
  /// Student-t degrees of freedom.
  pub nu: f64,
  pub var_95: f64,
  pub es_95: f64,
}

impl RiskEstimate {
  /// Derive VaR/ES at tail probability `alpha` from a fitted model.
  pub fn from_fit(fit: &GarchFit, alpha: f64) -> Result<Self> {
    let sigma = fit.sigma_next();
    let (var, es) = student_t_var_es(sigma, fit.nu, alpha)?;
    Ok(Self {
      sigma,
      nu: fit.nu,
      var_95: var,
      es_95: es,
    })
  }
}

/// Value-at-Risk and Expected Shortfall for a zero-mean Student-t return with
/// conditional volatility `sigma`, at lower-tail probability `alpha`.
pub fn student_t_var_es(sigma: f64, nu: f64, alpha: f64) -> Result<(f64, f64)> {
  if nu <= 2.0 {
    return Err(Error::InvalidDistributionParameter { nu });
  }
  if !(sigma.is_finite() && sigma > 0.0) {
    return Err(Error::ModelFit {
      model: "var/es".to_string(),
      reason: format!("non-positive volatility {sigma}"),
    });
  }
  if !(0.0..0.5).contains(&alpha) || alpha <= 0.0 {
    return Err(Error::MalformedInput(format!(
      "tail probability must be in (0, 0.5), got {alpha}"
    )));
  }

  let t = StudentsT::new(0.0, 1.0, nu).map_err(|e| Error::ModelFit {
    model: "var/es".to_string(),
    reason: e.to_string(),
  })?;

  let q = t.inverse_cdf(alpha);
  let scale = sigma * ((nu - 2.0) / nu).sqrt();
  let var = -scale * q;
  // The tail expectation of the standardized t is negative at q < 0; the
  // published formula's leading sign cancels against it, leaving a loss
  // magnitude.
  let es = scale * t.pdf(q) / (alpha * (1.0 - 2.0 / nu));

  Ok((var, es))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn var_and_es_are_positive_for_valid_shape() {
    let (var, es) = student_t_var_es(0.02, 6.0, 0.05).unwrap();
    assert!(var > 0.0);
    assert!(es > 0.0);
  }

  #[test]
  fn es_exceeds_var() {
    let (var, es) = student_t_var_es(0.02, 6.0, 0.05).unwrap();
    assert!(es > var, "es {es} should exceed var {var}");
  }

  #[test]
  fn var_scales_linearly_with_sigma() {
    let (v1, _) = student_t_var_es(0.01, 8.0, 0.05).unwrap();
    let (v2, _) = student_t_var_es(0.02, 8.0, 0.05).unwrap();
    assert!((v2 / v1 - 2.0).abs() < 1e-10);
  }

  #[test]
  fn heavy_tails_approach_the_normal_quantile_from_above() {
    // nu -> large: VaR tends to sigma * 1.645.
    let (var, _) = student_t_var_es(1.0, 1e6, 0.05).unwrap();
    assert!((var - 1.6449).abs() < 0.01);
  }

  #[test]
  fn rejects_shape_at_or_below_two() {
    let err = student_t_var_es(0.02, 2.0, 0.05).unwrap_err();
    assert!(matches!(err, Error::InvalidDistributionParameter { .. }));
    let err = student_t_var_es(0.02, 1.5, 0.05).unwrap_err();
    assert!(matches!(err, Error::InvalidDistributionParameter { .. }));
  }

  #[test]
  fn rejects_non_positive_sigma() {
    assert!(student_t_var_es(0.0, 6.0, 0.05).is_err());
    assert!(student_t_var_es(f64::NAN, 6.0, 0.05).is_err());
  }
}

//! # Accuracy
//!
//! $$
//! \mathrm{MAPE}=\frac1n\sum_i \frac{|y_i-\hat y_i|}{|y_i|}, \qquad
//! \mathrm{RMSE}=\sqrt{\frac1n\sum_i (y_i-\hat y_i)^2}
//! $$
//!
/// Mean Absolute Percentage Error as a fraction. Observations with
/// `|actual| < eps` contribute nothing, matching the usual guard against
/// division blow-ups near zero.
pub fn mape(actual: &[f64], forecast: &[f64]) -> f64 {
  let n = actual.len().min(forecast.len());
  if n == 0 {
    return f64::NAN;
  }

  let sum: f64 = actual
    .iter()
    .zip(forecast.iter())
    .map(|(a, f)| {
      if a.abs() < f64::EPSILON {
        0.0
      } else {
        (a - f).abs() / a.abs()
      }
    })
    .sum();

  sum / n as f64
}

/// Mean Squared Error.
pub fn mse(actual: &[f64], forecast: &[f64]) -> f64 {
  let n = actual.len().min(forecast.len());
  if n == 0 {
    return f64::NAN;
  }

  actual
    .iter()
    .zip(forecast.iter())
    .map(|(a, f)| (a - f).powi(2))
    .sum::<f64>()
    / n as f64
}

/// Root Mean Squared Error.
pub fn rmse(actual: &[f64], forecast: &[f64]) -> f64 {
  mse(actual, forecast).sqrt()
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;

  #[test]
  fn mape_of_exact_forecast_is_zero() {
    let y = vec![100.0, 101.0, 99.5];
    assert_eq!(mape(&y, &y), 0.0);
  }

  #[test]
  fn mape_is_fractional() {
    let actual = vec![100.0, 200.0];
    let forecast = vec![110.0, 180.0];
    // (0.1 + 0.1) / 2
    assert_abs_diff_eq!(mape(&actual, &forecast), 0.1, epsilon = 1e-12);
  }

  #[test]
  fn rmse_matches_hand_computation() {
    let actual = vec![1.0, 2.0, 3.0];
    let forecast = vec![2.0, 2.0, 1.0];
    let expected = ((1.0 + 0.0 + 4.0) / 3.0f64).sqrt();
    assert_abs_diff_eq!(rmse(&actual, &forecast), expected, epsilon = 1e-12);
  }

  #[test]
  fn empty_inputs_yield_nan() {
    assert!(mape(&[], &[]).is_nan());
    assert!(rmse(&[], &[]).is_nan());
  }
}

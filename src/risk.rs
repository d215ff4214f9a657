//! # Risk
//!
//! $$
//! \sigma_t^2 = \omega + \alpha r_{t-1}^2 + \beta \sigma_{t-1}^2, \qquad
//! \varepsilon_t \sim t_\nu
//! $$
//!
//! Conditional-volatility fitting and tail-risk measures. A fitted estimate
//! is valid for the single next period only; once a new trading day's return
//! arrives it is stale and must be refit.

pub mod garch;
pub mod measures;

pub use garch::fit_garch11_t;
pub use garch::GarchConfig;
pub use garch::GarchFit;
pub use measures::student_t_var_es;
pub use measures::RiskEstimate;

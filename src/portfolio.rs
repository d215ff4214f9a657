//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Weight construction schemes and Monte Carlo projection of portfolio
//! return distributions.

pub mod simulation;
pub mod weights;

pub use simulation::simulate_portfolio;
pub use simulation::HorizonScheme;
pub use simulation::SimulationConfig;
pub use simulation::SimulationSummary;
pub use weights::equal_weights;
pub use weights::inverse_volatility_weights;
pub use weights::mean_variance_weights;
pub use weights::return_proportional_weights;
pub use weights::MeanVarianceConfig;
pub use weights::WeightScheme;
pub use weights::WeightVector;

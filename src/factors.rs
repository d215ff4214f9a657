//! # Factors
//!
//! $$
//! R = V \Lambda V^\top, \qquad
//! \text{EVR}_k = \frac{\lambda_k}{\sum_j \lambda_j}
//! $$
//!
//! Correlation-based factor decomposition of the return panel.

pub mod pca;

pub use pca::principal_components;
pub use pca::PcaResult;

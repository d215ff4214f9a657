//! # Equity Panel Analysis
//!
//! `quantlab` runs a batch statistical pipeline over a wide panel of daily
//! OHLCV bars: return preprocessing, factor decomposition, event studies,
//! forecast ensembles, tail-risk estimation and Monte Carlo portfolio
//! simulation. Every stage consumes and produces explicit values; a run is
//! fully determined by its input panel, configuration and seed.
//!
//! ## Modules
//!
//! | Module          | Description                                                                  |
//! |-----------------|------------------------------------------------------------------------------|
//! | [`data`]        | OHLCV containers, CSV loading, log returns, rolling volatility, return panel. |
//! | [`factors`]     | PCA of the pairwise-complete return correlation matrix.                       |
//! | [`event_study`] | Market-model OLS and cumulative abnormal returns.                             |
//! | [`forecast`]    | AR / Holt / trend forecasters, holdout scoring and inverse-MAPE blending.     |
//! | [`risk`]        | GARCH(1,1)-t maximum likelihood and Student-t VaR / ES.                       |
//! | [`portfolio`]   | Weight schemes and Monte Carlo horizon simulation.                            |
//! | [`pipeline`]    | End-to-end batch orchestration with per-ticker failure isolation.             |
//! | [`report`]      | Plain-text table rendering of a finished run.                                 |
//!
//! ## Parallelism
//!
//! Per-ticker model fits are independent and run on the `rayon` thread pool;
//! Monte Carlo sampling is sequential per (strategy, horizon) pair so that a
//! fixed seed reproduces results exactly.

pub mod data;
pub mod error;
pub mod event_study;
pub mod factors;
pub mod forecast;
pub mod pipeline;
pub mod portfolio;
pub mod report;
pub mod risk;

pub use error::Error;
pub use error::Result;
pub use pipeline::AnalysisPipeline;
pub use pipeline::AnalysisReport;
pub use pipeline::PipelineConfig;

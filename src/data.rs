//! # Data
//!
//! $$
//! r_t = \ln S_t - \ln S_{t-1}
//! $$
//!
//! Price panels, log-return series and pairwise-complete moment estimation.

pub mod csv;
pub mod panel;
pub mod prices;
pub mod returns;

pub use csv::load_wide_ohlcv;
pub use csv::parse_wide_ohlcv;
pub use panel::ReturnPanel;
pub use prices::PriceBar;
pub use prices::PricePanel;
pub use prices::PriceSeries;
pub use returns::log_returns;
pub use returns::rolling_volatility;
pub use returns::ReturnObs;
pub use returns::ReturnSeries;

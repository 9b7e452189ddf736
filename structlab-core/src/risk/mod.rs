//! Trade levels, risk-to-reward and market-condition filters.

pub mod filters;
pub mod rr;

pub use filters::{liquidity_filter, volatility_filter, FilterResults, VOLATILITY_CEILING};
pub use rr::{build_trade_levels, compute_rr, RiskResult, RECENT_BARS};

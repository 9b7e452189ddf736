//! StructLab Runner: walk-forward backtesting, metrics, configuration and logging.
//!
//! Drives `structlab_core::AnalyzeAssetPipeline` over historical candle
//! bundles and reduces the simulated trades to summary statistics.

pub mod config;
pub mod data;
pub mod logging;
pub mod metrics;
pub mod walk_forward;

pub use crate::config::{BacktestConfig, ConfigError};
pub use data::{infer_bar_interval, load_bundle, CandleBundle, CandleSource, InMemorySource, LoadError};
pub use logging::{init_logging, LoggingConfig, LoggingError};
pub use metrics::{summarize, BacktestMetrics};
pub use walk_forward::{
    evaluate_signal, BacktestTrade, TradeOutcome, WalkForwardBacktester, WalkForwardConfig, WalkForwardError,
    WalkForwardResult,
};

//! Error types for analysis.
//!
//! Two failure classes: configuration errors are fatal for a run, data errors
//! mean a single invocation could not be satisfied (the backtester skips the
//! step). A gate that rejects a candidate signal is not an error; it yields an
//! empty signal list.

use thiserror::Error;

/// Invalid parameters. Raised before analysis starts or when derived trade
/// levels are unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("execution timeframe '{0}' is not among the configured timeframes")]
    ExecutionTimeframeMissing(String),
    #[error("timeframe list is empty")]
    EmptyTimeframes,
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("trade levels require at least one target")]
    EmptyTargets,
    #[error("entry and stop must be strictly positive (entry={entry}, stop={stop})")]
    NonPositivePrice { entry: f64, stop: f64 },
    #[error("fibonacci anchor high {high} must be above low {low}")]
    InvalidAnchor { high: f64, low: f64 },
}

/// Missing or unusable candle data for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("no candles supplied for timeframe '{0}'")]
    MissingTimeframe(String),
    #[error("candle series for timeframe '{0}' is empty")]
    EmptySeries(String),
    #[error("no candles for timeframe '{timeframe}' at or before {end}")]
    EmptyWindow { timeframe: String, end: String },
}

/// Any failure of a single-shot analysis call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Data(#[from] DataError),
}

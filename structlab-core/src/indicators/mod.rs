//! Indicator suite.
//!
//! Every indicator is a pure function: candle history in, a numeric series of
//! the same length out, with NaN warm-up at the head. Single-series indicators
//! also implement the `Indicator` trait so callers can treat them uniformly.

pub mod atr;
pub mod fibonacci;
pub mod momentum;
pub mod moving_averages;
pub mod patterns;
pub mod volatility;

pub use atr::{average_true_range, true_range, Atr};
pub use fibonacci::{align_with_swings, project_levels, FibLevel, FibonacciLevels, FIB_RATIOS};
pub use momentum::{
    compute_momentum_suite, detect_divergences, macd, rsi, stochastic, Divergences, Macd,
    MomentumSuite, Rsi, Stochastic,
};
pub use moving_averages::{
    compute_moving_averages, ema, kama, sma, wma, MaKind, MovingAverage, MovingAverageSuite,
};
pub use patterns::{compute_candle_patterns, CandlePatterns, PatternSummary};
pub use volatility::{atr_percentile, compute_volatility_suite, realized_volatility, VolatilitySuite};

use crate::domain::Candle;

/// Trait for single-series indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `candles`; the first
/// `lookback()` values are `f64::NAN` (warm-up).
///
/// No value at bar t may depend on candles after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Create synthetic 15-minute candles from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_candles(&data)
}

/// Create 15-minute candles from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Candle {
            symbol: "TEST".to_string(),
            timeframe: "15m".to_string(),
            timestamp: base + chrono::Duration::minutes(15 * i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
            source: "synthetic".to_string(),
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

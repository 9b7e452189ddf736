//! Volatility analytics: ATR percentile rank and annualized realized volatility.

use super::atr::average_true_range;
use crate::domain::{closes, Candle};
use crate::stats::{pct_change, rolling_apply, rolling_std};

/// Default rank window for `atr_percentile`.
pub const ATR_PERCENTILE_LOOKBACK: usize = 100;

/// Default return window for `realized_volatility`.
pub const REALIZED_VOL_PERIOD: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct VolatilitySuite {
    pub atr: Vec<f64>,
    pub atr_percentile: Vec<f64>,
    pub realized_vol: Vec<f64>,
}

/// Percentage (0–100) of the trailing `lookback` values that are <= the newest one.
pub fn atr_percentile(atr: &[f64], lookback: usize) -> Vec<f64> {
    rolling_apply(atr, lookback, |w| {
        let last = w[w.len() - 1];
        let below = w.iter().filter(|&&v| v <= last).count();
        below as f64 / w.len() as f64 * 100.0
    })
}

/// Rolling sample std of close-to-close returns, annualized by sqrt(252).
pub fn realized_volatility(candles: &[Candle], period: usize) -> Vec<f64> {
    let returns = pct_change(&closes(candles));
    rolling_std(&returns, period)
        .into_iter()
        .map(|v| v * 252.0_f64.sqrt())
        .collect()
}

/// ATR, its percentile rank (warm-up ATR treated as 0) and realized volatility.
pub fn compute_volatility_suite(candles: &[Candle], atr_period: usize) -> VolatilitySuite {
    let atr = average_true_range(candles, atr_period);
    let atr_zero_filled: Vec<f64> = atr
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { *v })
        .collect();
    VolatilitySuite {
        atr_percentile: atr_percentile(&atr_zero_filled, ATR_PERCENTILE_LOOKBACK),
        realized_vol: realized_volatility(candles, REALIZED_VOL_PERIOD),
        atr,
    }
}

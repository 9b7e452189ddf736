//! Trending / ranging regime classification.

use serde::{Deserialize, Serialize};

use crate::domain::{closes, Candle, RegimeLabel};
use crate::indicators::{compute_volatility_suite, ema, sma};
use crate::stats::{median, std_dev};

/// Trend strength below this is ranging regardless of volatility.
pub const MIN_TREND_STRENGTH: f64 = 0.005;

/// Bars required before the Hurst exponent is estimated.
const HURST_MIN_BARS: usize = 41;
const HURST_MAX_LAG: usize = 20;
const REGIME_ATR_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub label: RegimeLabel,
    pub hurst: f64,
    pub trend_strength: f64,
    pub volatility_percentile: f64,
}

/// Hurst exponent from the log-log slope of lagged-difference dispersion.
///
/// For lags 2..max_lag, tau = sqrt(std(x[t+lag] - x[t])); the fitted slope of
/// ln(tau) on ln(lag) times two. Non-finite points are dropped; with fewer than
/// two usable lags the result is 0.5.
pub fn hurst_exponent(values: &[f64], max_lag: usize) -> f64 {
    let mut points = Vec::new();
    for lag in 2..max_lag {
        if lag >= values.len() {
            break;
        }
        let diffs: Vec<f64> = values[lag..]
            .iter()
            .zip(&values[..values.len() - lag])
            .map(|(a, b)| a - b)
            .collect();
        let tau = population_std(&diffs).sqrt();
        let (x, y) = ((lag as f64).ln(), tau.ln());
        if x.is_finite() && y.is_finite() {
            points.push((x, y));
        }
    }
    if points.len() < 2 {
        return 0.5;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let cov: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    let var: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    if var == 0.0 {
        return 0.5;
    }
    cov / var * 2.0
}

fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    std_dev(values) * ((n - 1.0) / n).sqrt()
}

/// Classify the window's regime from its last bar.
///
/// Trend strength = |EMA20 - EMA50| / SMA50. Ranging when trend strength is
/// below 0.005 or the latest realized volatility is below its window median.
pub fn detect_regime(candles: &[Candle]) -> RegimeState {
    let close = closes(candles);
    let ema20 = ema(&close, 20);
    let ema50 = ema(&close, 50);
    let sma50 = sma(&close, 50);

    let trend_strength = match (ema20.last(), ema50.last(), sma50.last()) {
        (Some(fast), Some(slow), Some(base)) => {
            let value = (fast - slow).abs() / base;
            if value.is_finite() {
                value
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    let vol = compute_volatility_suite(candles, REGIME_ATR_PERIOD);
    let volatility_percentile = vol
        .atr_percentile
        .last()
        .copied()
        .filter(|v| !v.is_nan())
        .unwrap_or(0.0);

    let hurst = if candles.len() >= HURST_MIN_BARS {
        hurst_exponent(&close, HURST_MAX_LAG)
    } else {
        0.5
    };

    let realized: Vec<f64> = vol
        .realized_vol
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { *v })
        .collect();
    let latest_vol = realized.last().copied().unwrap_or(0.0);

    let label = if trend_strength < MIN_TREND_STRENGTH || latest_vol < median(&realized) {
        RegimeLabel::Ranging
    } else {
        RegimeLabel::Trending
    };

    RegimeState {
        label,
        hurst,
        trend_strength,
        volatility_percentile,
    }
}

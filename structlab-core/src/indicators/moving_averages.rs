//! Moving averages: SMA, EMA, WMA and Kaufman's adaptive MA (KAMA).
//!
//! EMA is seeded with the first value (no SMA warm-up), so it is defined from
//! index 0. SMA and WMA are NaN until a full window is available.

use std::collections::BTreeMap;

use super::Indicator;
use crate::domain::{closes, Candle};
use crate::error::ConfigurationError;
use crate::stats::{fill_gaps, rolling_apply, rolling_mean};

/// Rolling mean over `period` values.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    rolling_mean(values, period)
}

/// Exponential moving average, alpha = 2 / (period + 1), seeded at the first value.
///
/// NaN gaps are back-filled then forward-filled before smoothing.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let filled = fill_gaps(values);
    let mut result = vec![f64::NAN; filled.len()];
    if filled.is_empty() || period == 0 {
        return result;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    result[0] = filled[0];
    for i in 1..filled.len() {
        result[i] = alpha * filled[i] + (1.0 - alpha) * result[i - 1];
    }
    result
}

/// Linearly weighted moving average: weights 1..=period, newest heaviest.
pub fn wma(values: &[f64], period: usize) -> Vec<f64> {
    let denom = (period * (period + 1)) as f64 / 2.0;
    rolling_apply(values, period, |w| {
        w.iter()
            .enumerate()
            .map(|(i, v)| v * (i + 1) as f64)
            .sum::<f64>()
            / denom
    })
}

/// Kaufman adaptive moving average with fast = 2, slow = 30.
pub fn kama(values: &[f64], period: usize) -> Vec<f64> {
    kama_with(values, period, 2, 30)
}

/// KAMA with explicit fast/slow smoothing constants.
///
/// Efficiency ratio er = |p[i] - p[i-period]| / sum(|p[j] - p[j-1]|) over the
/// window, clipped to [0, 1]. Where er is undefined (warm-up, flat window)
/// the previous KAMA value is carried.
pub fn kama_with(values: &[f64], period: usize, fast: usize, slow: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if n == 0 {
        return out;
    }

    let fast_sc = 2.0 / (fast as f64 + 1.0);
    let slow_sc = 2.0 / (slow as f64 + 1.0);

    let mut abs_diff = vec![f64::NAN; n];
    for i in 1..n {
        abs_diff[i] = (values[i] - values[i - 1]).abs();
    }
    let volatility = rolling_apply(&abs_diff, period, |w| w.iter().sum());

    out[0] = values[0];
    for i in 1..n {
        let sc = if period > 0 && i >= period && volatility[i] > 0.0 {
            let change = (values[i] - values[i - period]).abs();
            let er = (change / volatility[i]).clamp(0.0, 1.0);
            (er * (fast_sc - slow_sc) + slow_sc).powi(2)
        } else {
            f64::NAN
        };
        out[i] = if sc.is_nan() {
            out[i - 1]
        } else {
            out[i - 1] + sc * (values[i] - out[i - 1])
        };
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaKind {
    Sma,
    Ema,
    Wma,
    Kama,
}

impl MaKind {
    fn prefix(self) -> &'static str {
        match self {
            MaKind::Sma => "sma",
            MaKind::Ema => "ema",
            MaKind::Wma => "wma",
            MaKind::Kama => "kama",
        }
    }
}

/// A moving average of close prices as an `Indicator`.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    kind: MaKind,
    period: usize,
    name: String,
}

impl MovingAverage {
    pub fn new(kind: MaKind, period: usize) -> Self {
        assert!(period >= 1, "moving average period must be >= 1");
        Self {
            kind,
            period,
            name: format!("{}_{period}", kind.prefix()),
        }
    }
}

impl Indicator for MovingAverage {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.kind {
            MaKind::Sma | MaKind::Wma => self.period - 1,
            MaKind::Ema | MaKind::Kama => 0,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let close = closes(candles);
        match self.kind {
            MaKind::Sma => sma(&close, self.period),
            MaKind::Ema => ema(&close, self.period),
            MaKind::Wma => wma(&close, self.period),
            MaKind::Kama => kama(&close, self.period),
        }
    }
}

/// All four averages for each requested period.
#[derive(Debug, Clone, Default)]
pub struct MovingAverageSuite {
    pub sma: BTreeMap<usize, Vec<f64>>,
    pub ema: BTreeMap<usize, Vec<f64>>,
    pub wma: BTreeMap<usize, Vec<f64>>,
    pub kama: BTreeMap<usize, Vec<f64>>,
}

/// Compute the suite for the distinct positive `periods`.
pub fn compute_moving_averages(
    values: &[f64],
    periods: &[usize],
) -> Result<MovingAverageSuite, ConfigurationError> {
    let mut unique: Vec<usize> = periods.iter().copied().filter(|&p| p > 0).collect();
    unique.sort_unstable();
    unique.dedup();
    if unique.is_empty() {
        return Err(ConfigurationError::InvalidParameter {
            name: "periods",
            reason: "at least one positive period required".into(),
        });
    }

    let mut suite = MovingAverageSuite::default();
    for p in unique {
        suite.sma.insert(p, sma(values, p));
        suite.ema.insert(p, ema(values, p));
        suite.wma.insert(p, wma(values, p));
        suite.kama.insert(p, kama(values, p));
    }
    Ok(suite)
}

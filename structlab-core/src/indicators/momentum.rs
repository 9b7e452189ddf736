//! Momentum oscillators: RSI, MACD, stochastic, and price/oscillator divergences.
//!
//! RSI uses Wilder smoothing (alpha = 1/period) seeded at the first change.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0; both → 50.

use super::moving_averages::ema;
use super::Indicator;
use crate::domain::{closes, highs, lows, Candle};
use crate::stats::{rolling_max, rolling_mean, rolling_min};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        rsi(&closes(candles), self.period)
    }
}

pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < 2 || period == 0 {
        return result;
    }

    let alpha = 1.0 / period as f64;
    let mut state: Option<(f64, f64)> = None;
    for i in 1..n {
        let change = values[i] - values[i - 1];
        if change.is_nan() {
            continue;
        }
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let (avg_gain, avg_loss) = match state {
            None => (gain, loss),
            Some((g, l)) => (alpha * gain + (1.0 - alpha) * g, alpha * loss + (1.0 - alpha) * l),
        };
        state = Some((avg_gain, avg_loss));
        result[i] = compute_rsi(avg_gain, avg_loss);
    }
    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Macd {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub hist: Vec<f64>,
}

/// MACD line = EMA(fast) - EMA(slow); signal = EMA(signal) of the line.
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&line, signal);
    let hist = line.iter().zip(&signal_line).map(|(m, s)| m - s).collect();
    Macd {
        macd: line,
        signal: signal_line,
        hist,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Stochastic {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// %K over `k` bars and its `d`-bar mean. NaN where the range is flat.
pub fn stochastic(candles: &[Candle], k: usize, d: usize) -> Stochastic {
    let lowest = rolling_min(&lows(candles), k);
    let highest = rolling_max(&highs(candles), k);
    let k_values: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let range = highest[i] - lowest[i];
            if range > 0.0 {
                100.0 * (c.close - lowest[i]) / range
            } else {
                f64::NAN
            }
        })
        .collect();
    let d_values = rolling_mean(&k_values, d);
    Stochastic {
        k: k_values,
        d: d_values,
    }
}

#[derive(Debug, Clone, Default)]
pub struct Divergences {
    pub bullish: Vec<bool>,
    pub bearish: Vec<bool>,
}

/// Classic divergence flags.
///
/// For each bar `idx >= lookback`, the window is the `lookback` bars strictly
/// before `idx`. Bullish: the window's lowest price is below the lowest price
/// that preceded it inside the window while the oscillator printed a higher
/// value. Bearish mirrors this on highs.
pub fn detect_divergences(price: &[f64], oscillator: &[f64], lookback: usize) -> Divergences {
    let n = price.len();
    let mut bullish = vec![false; n];
    let mut bearish = vec![false; n];
    if lookback == 0 || oscillator.len() != n {
        return Divergences { bullish, bearish };
    }

    for idx in lookback..n {
        let start = idx - lookback;
        let window = &price[start..idx];

        let low = start + argmin(window);
        if low > start {
            let prev_low = start + argmin(&price[start..low]);
            if price[low] < price[prev_low] && oscillator[low] > oscillator[prev_low] {
                bullish[idx] = true;
            }
        }

        let high = start + argmax(window);
        if high > start {
            let prev_high = start + argmax(&price[start..high]);
            if price[high] > price[prev_high] && oscillator[high] < oscillator[prev_high] {
                bearish[idx] = true;
            }
        }
    }
    Divergences { bullish, bearish }
}

// First occurrence of the extreme.
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v < values[best] {
            best = i;
        }
    }
    best
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Clone, Default)]
pub struct MomentumSuite {
    pub rsi: Vec<f64>,
    pub macd: Macd,
    pub stochastic: Stochastic,
    pub divergences: Divergences,
}

impl MomentumSuite {
    /// True when the newest bar carries a bullish or bearish divergence.
    pub fn divergence_on_last_bar(&self) -> bool {
        self.divergences.bullish.last().copied().unwrap_or(false)
            || self.divergences.bearish.last().copied().unwrap_or(false)
    }
}

/// RSI(14), MACD(12, 26, 9), stochastic(14, 3) and close-vs-MACD divergences.
pub fn compute_momentum_suite(candles: &[Candle], divergence_lookback: usize) -> MomentumSuite {
    let close = closes(candles);
    let macd = macd(&close, 12, 26, 9);
    let osc: Vec<f64> = macd
        .macd
        .iter()
        .map(|v| if v.is_nan() { 0.0 } else { *v })
        .collect();
    MomentumSuite {
        rsi: rsi(&close, 14),
        stochastic: stochastic(candles, 14, 3),
        divergences: detect_divergences(&close, &osc, divergence_lookback),
        macd,
    }
}

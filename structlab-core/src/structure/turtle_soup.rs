//! Turtle soup: a breach of the prior N-bar extreme that closes back against it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurtleSoupSignal {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    /// The breached prior extreme.
    pub level: f64,
}

pub fn detect_turtle_soup(candles: &[Candle], lookback: usize) -> Vec<TurtleSoupSignal> {
    let mut signals = Vec::new();
    if lookback == 0 {
        return signals;
    }
    for idx in lookback..candles.len() {
        let prior = &candles[idx - lookback..idx];
        let prior_high = prior.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let prior_low = prior.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let bar = &candles[idx];
        let prev_close = candles[idx - 1].close;

        if bar.high > prior_high && bar.close < prev_close {
            signals.push(TurtleSoupSignal {
                timestamp: bar.timestamp,
                direction: Direction::Bearish,
                level: prior_high,
            });
        }
        if bar.low < prior_low && bar.close > prev_close {
            signals.push(TurtleSoupSignal {
                timestamp: bar.timestamp,
                direction: Direction::Bullish,
                level: prior_low,
            });
        }
    }
    signals
}

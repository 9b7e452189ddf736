//! Fair value gaps: three-candle imbalances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    /// Timestamp of the oldest candle of the triple.
    pub start: DateTime<Utc>,
    /// Timestamp of the newest candle of the triple.
    pub end: DateTime<Utc>,
    pub direction: Direction,
    pub filled: bool,
    pub lower: f64,
    pub upper: f64,
}

/// Scan every triple (older, middle, current).
///
/// Bullish: `older.high < current.low` by at least `min_size × current.low`;
/// filled when the middle or current low reaches back to `older.high`.
/// Bearish mirrors this on `older.low` / `current.high`.
pub fn find_fvg(candles: &[Candle], min_size: f64) -> Vec<FairValueGap> {
    let mut gaps = Vec::new();
    for idx in 2..candles.len() {
        let older = &candles[idx - 2];
        let middle = &candles[idx - 1];
        let current = &candles[idx];

        if older.high < current.low && current.low - older.high >= min_size * current.low {
            gaps.push(FairValueGap {
                start: older.timestamp,
                end: current.timestamp,
                direction: Direction::Bullish,
                filled: middle.low.min(current.low) <= older.high,
                lower: older.high,
                upper: current.low,
            });
        }
        if older.low > current.high && older.low - current.high >= min_size * current.high {
            gaps.push(FairValueGap {
                start: older.timestamp,
                end: current.timestamp,
                direction: Direction::Bearish,
                filled: middle.high.max(current.high) >= older.low,
                lower: current.high,
                upper: older.low,
            });
        }
    }
    gaps
}

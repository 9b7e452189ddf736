//! Price-action candle patterns: engulfing, pin bar, inside bar.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

/// Wick share of the range a pin bar needs.
pub const PIN_BAR_WICK_RATIO: f64 = 0.66;

/// Maximum body share of the range for a pin bar.
pub const PIN_BAR_MAX_BODY_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Default)]
pub struct CandlePatterns {
    pub engulfing: Vec<bool>,
    pub pin_bar: Vec<bool>,
    pub inside_bar: Vec<bool>,
}

/// Per-pattern occurrence counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub engulfing: usize,
    pub pin_bar: usize,
    pub inside_bar: usize,
}

impl CandlePatterns {
    pub fn summarize(&self) -> PatternSummary {
        let count = |flags: &[bool]| flags.iter().filter(|f| **f).count();
        PatternSummary {
            engulfing: count(&self.engulfing),
            pin_bar: count(&self.pin_bar),
            inside_bar: count(&self.inside_bar),
        }
    }
}

/// Larger opposite-coloured body whose range covers the previous bar's range.
pub fn detect_engulfing(candles: &[Candle]) -> Vec<bool> {
    let mut out = vec![false; candles.len()];
    for i in 1..candles.len() {
        let (prev, cur) = (&candles[i - 1], &candles[i]);
        let direction = cur.close - cur.open;
        let prev_direction = prev.close - prev.open;
        out[i] = cur.body() > prev.body()
            && direction * prev_direction < 0.0
            && cur.high >= prev.high
            && cur.low <= prev.low;
    }
    out
}

/// Long wick (> 66% of range) on either side with a small body (< 30% of range).
pub fn detect_pin_bar(candles: &[Candle]) -> Vec<bool> {
    candles
        .iter()
        .map(|c| {
            let range = c.range();
            if range <= 0.0 {
                return false;
            }
            let upper_wick = c.high - c.close.max(c.open);
            let lower_wick = c.open.min(c.close) - c.low;
            let small_body = c.body() / range < PIN_BAR_MAX_BODY_RATIO;
            small_body
                && (lower_wick / range > PIN_BAR_WICK_RATIO
                    || upper_wick / range > PIN_BAR_WICK_RATIO)
        })
        .collect()
}

/// Range contained within the previous bar's range.
pub fn detect_inside_bar(candles: &[Candle]) -> Vec<bool> {
    let mut out = vec![false; candles.len()];
    for i in 1..candles.len() {
        out[i] = candles[i].high <= candles[i - 1].high && candles[i].low >= candles[i - 1].low;
    }
    out
}

pub fn compute_candle_patterns(candles: &[Candle]) -> CandlePatterns {
    CandlePatterns {
        engulfing: detect_engulfing(candles),
        pin_bar: detect_pin_bar(candles),
        inside_bar: detect_inside_bar(candles),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_candles;

    #[test]
    fn bullish_engulfing_detected() {
        let candles = make_ohlc_candles(&[
            (101.0, 101.5, 99.5, 100.0), // small bearish
            (99.0, 103.0, 98.0, 102.5),  // large bullish covering it
        ]);
        assert_eq!(detect_engulfing(&candles), vec![false, true]);
    }

    #[test]
    fn same_colour_is_not_engulfing() {
        let candles = make_ohlc_candles(&[(100.0, 101.5, 99.5, 101.0), (99.0, 103.0, 98.0, 102.5)]);
        assert_eq!(detect_engulfing(&candles), vec![false, false]);
    }

    #[test]
    fn hammer_is_pin_bar() {
        // range 10, lower wick 9, body 0.5
        let candles = make_ohlc_candles(&[(99.5, 100.5, 90.5, 100.0)]);
        assert_eq!(detect_pin_bar(&candles), vec![true]);
    }

    #[test]
    fn zero_range_is_not_pin_bar() {
        let candles = make_ohlc_candles(&[(100.0, 100.0, 100.0, 100.0)]);
        assert_eq!(detect_pin_bar(&candles), vec![false]);
    }

    #[test]
    fn inside_bar_and_summary() {
        let candles = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 101.0),
            (101.0, 104.0, 96.0, 102.0),
            (102.0, 106.0, 96.0, 103.0),
        ]);
        let patterns = compute_candle_patterns(&candles);
        assert_eq!(patterns.inside_bar, vec![false, true, false]);
        assert_eq!(patterns.summarize().inside_bar, 1);
    }
}

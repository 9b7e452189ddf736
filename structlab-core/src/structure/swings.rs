//! Adaptive zig-zag swing detection.
//!
//! A running anchor (index, price, kind) is kept. When the close moves away
//! from the anchor by at least `multiplier × ATR(anchor)` against the anchor's
//! kind, a swing is recorded at the most extreme high/low since the anchor and
//! the anchor flips to it. Swings therefore alternate by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, SwingKind};
use crate::indicators::average_true_range;
use crate::stats::fill_gaps;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// Bar index in the analysed window.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub kind: SwingKind,
}

/// Detect swings, earliest first.
///
/// The first bar is always a swing: if detection does not produce one at
/// index 0, a seed at the first close is prepended. The seed's kind comes from
/// the first two closes (falling ⇒ high, otherwise low) and is also the
/// starting anchor kind, so the seed alternates with the first detected swing.
pub fn compute_swings(candles: &[Candle], atr_period: usize, atr_multiplier: f64) -> Vec<SwingPoint> {
    let n = candles.len();
    if n == 0 {
        return Vec::new();
    }

    let atr = fill_gaps(&average_true_range(candles, atr_period));
    let seed_kind = if n > 1 && candles[0].close > candles[1].close {
        SwingKind::High
    } else {
        SwingKind::Low
    };

    let mut swings = Vec::new();
    let mut anchor_idx = 0;
    let mut anchor_price = candles[0].close;
    let mut anchor_kind = seed_kind;
    let mut threshold = atr_multiplier * atr[0];

    for i in 1..n {
        if threshold.is_nan() {
            threshold = atr_multiplier * atr[i];
        }
        let moved = candles[i].close - anchor_price;
        let next = match anchor_kind {
            SwingKind::Low if moved >= threshold => {
                let idx = extreme_index(&candles[anchor_idx..=i], |c| c.high, |a, b| a > b) + anchor_idx;
                Some((idx, candles[idx].high, SwingKind::High))
            }
            SwingKind::High if moved <= -threshold => {
                let idx = extreme_index(&candles[anchor_idx..=i], |c| c.low, |a, b| a < b) + anchor_idx;
                Some((idx, candles[idx].low, SwingKind::Low))
            }
            _ => None,
        };
        if let Some((idx, price, kind)) = next {
            swings.push(SwingPoint {
                index: idx,
                timestamp: candles[idx].timestamp,
                price,
                kind,
            });
            anchor_idx = idx;
            anchor_price = price;
            anchor_kind = kind;
            threshold = atr_multiplier * atr[idx];
        }
    }

    if swings.first().map_or(true, |s| s.index != 0) {
        swings.insert(
            0,
            SwingPoint {
                index: 0,
                timestamp: candles[0].timestamp,
                price: candles[0].close,
                kind: seed_kind,
            },
        );
    }
    swings
}

// First occurrence of the extreme under `better`.
fn extreme_index(
    candles: &[Candle],
    value: impl Fn(&Candle) -> f64,
    better: impl Fn(f64, f64) -> bool,
) -> usize {
    let mut best = 0;
    for (i, c) in candles.iter().enumerate() {
        if better(value(c), value(&candles[best])) {
            best = i;
        }
    }
    best
}

/// Most recent swing of the given kind.
pub fn latest_swing(swings: &[SwingPoint], kind: SwingKind) -> Option<&SwingPoint> {
    swings.iter().rev().find(|s| s.kind == kind)
}

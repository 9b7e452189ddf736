//! Order blocks: the last opposite-coloured candle before a break of structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bos_choch::StructureEvent;
use crate::domain::{Candle, Direction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub timestamp: DateTime<Utc>,
    /// Bar index of the anchor candle.
    pub index: usize,
    pub direction: Direction,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// A later candle traded through the anchor's extreme (low for bullish, high for bearish).
    pub mitigated: bool,
}

/// Index of the last candle at or before `ts`.
pub(crate) fn bar_at_or_before(candles: &[Candle], ts: DateTime<Utc>) -> Option<usize> {
    candles.partition_point(|c| c.timestamp <= ts).checked_sub(1)
}

/// One block per BOS event; CHOCH events are ignored.
///
/// Scans back up to `lookback` bars from the break bar (inclusive) for the
/// last bearish candle (bullish break) or bullish candle (bearish break).
pub fn find_order_blocks(candles: &[Candle], events: &[StructureEvent], lookback: usize) -> Vec<OrderBlock> {
    let mut blocks = Vec::new();
    for event in events.iter().filter(|e| e.is_bos()) {
        let Some(idx) = bar_at_or_before(candles, event.timestamp) else {
            continue;
        };
        let start = idx.saturating_sub(lookback);
        let opposite = |c: &Candle| match event.direction {
            Direction::Bullish => c.is_bearish(),
            Direction::Bearish => c.is_bullish(),
        };
        let Some(anchor) = (start..=idx).rev().find(|&i| opposite(&candles[i])) else {
            continue;
        };

        let c = &candles[anchor];
        let later = &candles[anchor + 1..];
        let mitigated = match event.direction {
            Direction::Bullish => later.iter().any(|l| l.low < c.low),
            Direction::Bearish => later.iter().any(|l| l.high > c.high),
        };
        blocks.push(OrderBlock {
            timestamp: c.timestamp,
            index: anchor,
            direction: event.direction,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            mitigated,
        });
    }
    blocks
}

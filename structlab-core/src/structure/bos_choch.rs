//! Break of structure (BOS) and change of character (CHOCH).
//!
//! Walks consecutive swing triples with alternating kinds, comparing the
//! newest swing with the same-kind swing two positions back. Moves smaller
//! than `tolerance × price` are ignored.
//!
//! | Newest swing | Tracked trend | Event |
//! |---|---|---|
//! | higher high | any | bullish BOS |
//! | lower low | any | bearish BOS |
//! | lower high | bullish | bearish CHOCH |
//! | higher low | bearish | bullish CHOCH |
//!
//! Every event sets the tracked trend to its own direction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::swings::SwingPoint;
use crate::domain::{Direction, StructureKind, SwingKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: StructureKind,
    pub direction: Direction,
    /// Position of the breaking swing in the swing sequence.
    pub swing_index: usize,
    /// Bar index of the breaking swing.
    pub bar_index: usize,
}

impl StructureEvent {
    pub fn is_bos(&self) -> bool {
        self.kind == StructureKind::Bos
    }
}

pub fn detect_structure(swings: &[SwingPoint], tolerance: f64) -> Vec<StructureEvent> {
    let mut events = Vec::new();
    if swings.len() < 3 {
        return events;
    }

    let mut trend: Option<Direction> = None;
    for idx in 2..swings.len() {
        let (older, prev, current) = (&swings[idx - 2], &swings[idx - 1], &swings[idx]);
        let band = tolerance * older.price.abs();
        let higher = current.price > older.price + band;
        let lower = current.price < older.price - band;
        let event = match (older.kind, prev.kind, current.kind) {
            (SwingKind::High, SwingKind::Low, SwingKind::High) => {
                if higher {
                    Some((StructureKind::Bos, Direction::Bullish))
                } else if lower && trend == Some(Direction::Bullish) {
                    Some((StructureKind::Choch, Direction::Bearish))
                } else {
                    None
                }
            }
            (SwingKind::Low, SwingKind::High, SwingKind::Low) => {
                if lower {
                    Some((StructureKind::Bos, Direction::Bearish))
                } else if higher && trend == Some(Direction::Bearish) {
                    Some((StructureKind::Choch, Direction::Bullish))
                } else {
                    None
                }
            }
            _ => None,
        };
        let Some((kind, direction)) = event else {
            continue;
        };

        events.push(StructureEvent {
            timestamp: current.timestamp,
            kind,
            direction,
            swing_index: idx,
            bar_index: current.index,
        });
        trend = Some(direction);
    }
    events
}

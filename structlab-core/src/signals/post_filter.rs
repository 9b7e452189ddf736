//! Post-processing applied to built signals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::{Side, TradingSignal};

/// Drop signals fired too soon after an earlier one for the same symbol and side.
///
/// Signals are grouped by `(symbol, direction)` and ordered by `created_at`.
/// The first of each group is kept; a later one is kept only when at least
/// `window_minutes` have passed since the last kept signal. Output is grouped
/// in key order, chronological within a group.
pub fn deduplicate(signals: Vec<TradingSignal>, window_minutes: i64) -> Vec<TradingSignal> {
    let mut groups: BTreeMap<(String, Side), Vec<TradingSignal>> = BTreeMap::new();
    for signal in signals {
        groups
            .entry((signal.symbol.clone(), signal.direction))
            .or_default()
            .push(signal);
    }

    let mut kept = Vec::new();
    for (_, mut group) in groups {
        group.sort_by_key(|s| s.created_at);
        let mut last_kept: Option<DateTime<Utc>> = None;
        for signal in group {
            let due = match last_kept {
                None => true,
                Some(ts) => (signal.created_at - ts).num_seconds() >= window_minutes * 60,
            };
            if due {
                last_kept = Some(signal.created_at);
                kept.push(signal);
            }
        }
    }
    kept
}

pub fn enforce_quality(signals: Vec<TradingSignal>, min_score: f64) -> Vec<TradingSignal> {
    signals.into_iter().filter(|s| s.score >= min_score).collect()
}

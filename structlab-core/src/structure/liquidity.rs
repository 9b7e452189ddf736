//! Liquidity zones: clustered equal highs/lows plus session and daily extremes.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Session};

/// Relative component of the closeness check, added to the absolute tolerance.
const CLOSE_RTOL: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiquidityKind {
    EqualHigh,
    EqualLow,
    SessionHigh(Session),
    SessionLow(Session),
    DailyHigh,
    DailyLow,
}

impl fmt::Display for LiquidityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiquidityKind::EqualHigh => f.write_str("equal_high"),
            LiquidityKind::EqualLow => f.write_str("equal_low"),
            LiquidityKind::SessionHigh(s) => write!(f, "{s}_high"),
            LiquidityKind::SessionLow(s) => write!(f, "{s}_low"),
            LiquidityKind::DailyHigh => f.write_str("daily_high"),
            LiquidityKind::DailyLow => f.write_str("daily_low"),
        }
    }
}

impl From<LiquidityKind> for String {
    fn from(kind: LiquidityKind) -> Self {
        kind.to_string()
    }
}

impl TryFrom<String> for LiquidityKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let kind = match value.as_str() {
            "equal_high" => LiquidityKind::EqualHigh,
            "equal_low" => LiquidityKind::EqualLow,
            "daily_high" => LiquidityKind::DailyHigh,
            "daily_low" => LiquidityKind::DailyLow,
            "asia_high" => LiquidityKind::SessionHigh(Session::Asia),
            "asia_low" => LiquidityKind::SessionLow(Session::Asia),
            "europe_high" => LiquidityKind::SessionHigh(Session::Europe),
            "europe_low" => LiquidityKind::SessionLow(Session::Europe),
            "us_high" => LiquidityKind::SessionHigh(Session::Us),
            "us_low" => LiquidityKind::SessionLow(Session::Us),
            other => return Err(format!("unknown liquidity kind '{other}'")),
        };
        Ok(kind)
    }
}

impl Serialize for LiquidityKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LiquidityKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        LiquidityKind::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityZone {
    pub level: f64,
    pub kind: LiquidityKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// >= 2 for clustered zones, 1 for single-period extremes.
    pub touches: usize,
}

fn is_close(a: f64, b: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + CLOSE_RTOL * b.abs()
}

/// Cluster `(timestamp, level)` observations.
///
/// An observation joins the first cluster whose mean is within
/// `tolerance × level`; the mean is updated touch-weighted. A new cluster
/// opens with two touches (the observation and the level it equalled).
fn group_levels(levels: &[(DateTime<Utc>, f64)], tolerance: f64, kind: LiquidityKind) -> Vec<LiquidityZone> {
    let mut zones: Vec<LiquidityZone> = Vec::new();
    for &(ts, level) in levels {
        match zones
            .iter_mut()
            .find(|z| (z.level - level).abs() <= tolerance * level.abs())
        {
            Some(zone) => {
                let touches = zone.touches as f64;
                zone.level = (zone.level * touches + level) / (touches + 1.0);
                zone.end = ts;
                zone.touches += 1;
            }
            None => zones.push(LiquidityZone {
                level,
                kind,
                start: ts,
                end: ts,
                touches: 2,
            }),
        }
    }
    zones.retain(|z| z.touches >= 2);
    zones
}

/// Equal highs and lows.
///
/// For every bar `last` with a full `lookback` window ending at it, the bar's
/// high is an equal high when it is (within tolerance) the window maximum and
/// the maximum of the other bars in the window is also within tolerance of it.
/// Lows mirror this.
pub fn detect_equal_highs_lows(candles: &[Candle], lookback: usize, tolerance: f64) -> Vec<LiquidityZone> {
    let mut equal_highs = Vec::new();
    let mut equal_lows = Vec::new();
    if lookback < 2 {
        return Vec::new();
    }

    for end in lookback..=candles.len() {
        let window = &candles[end - lookback..end];
        let (others, last) = window.split_at(window.len() - 1);
        let last = &last[0];

        let window_high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let high_atol = tolerance * last.high;
        if is_close(window_high, last.high, high_atol) {
            let prev_high = others.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            if is_close(prev_high, last.high, high_atol) {
                equal_highs.push((last.timestamp, last.high));
            }
        }

        let window_low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let low_atol = if last.low != 0.0 { tolerance * last.low.abs() } else { tolerance };
        if is_close(window_low, last.low, low_atol) {
            let prev_low = others.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            if is_close(prev_low, last.low, tolerance * last.low.abs().max(1e-6)) {
                equal_lows.push((last.timestamp, last.low));
            }
        }
    }

    let mut zones = group_levels(&equal_highs, tolerance, LiquidityKind::EqualHigh);
    zones.extend(group_levels(&equal_lows, tolerance, LiquidityKind::EqualLow));
    zones
}

/// Highest high and lowest low per bucket, first occurrence wins ties.
fn bucket_extremes<K: Ord>(
    candles: &[Candle],
    key: impl Fn(&Candle) -> K,
) -> BTreeMap<K, (usize, usize)> {
    let mut buckets: BTreeMap<K, (usize, usize)> = BTreeMap::new();
    for (i, c) in candles.iter().enumerate() {
        let entry = buckets.entry(key(c)).or_insert((i, i));
        if c.high > candles[entry.0].high {
            entry.0 = i;
        }
        if c.low < candles[entry.1].low {
            entry.1 = i;
        }
    }
    buckets
}

fn extreme_zone(candle: &Candle, level: f64, kind: LiquidityKind) -> LiquidityZone {
    LiquidityZone {
        level,
        kind,
        start: candle.timestamp,
        end: candle.timestamp,
        touches: 1,
    }
}

/// High and low of each trading session present in the window.
pub fn session_high_low(candles: &[Candle]) -> Vec<LiquidityZone> {
    bucket_extremes(candles, |c| Session::of(c.timestamp))
        .into_iter()
        .flat_map(|(session, (hi, lo))| {
            [
                extreme_zone(&candles[hi], candles[hi].high, LiquidityKind::SessionHigh(session)),
                extreme_zone(&candles[lo], candles[lo].low, LiquidityKind::SessionLow(session)),
            ]
        })
        .collect()
}

/// High and low of each UTC calendar day in the window.
pub fn daily_levels(candles: &[Candle]) -> Vec<LiquidityZone> {
    bucket_extremes(candles, |c| -> NaiveDate { c.timestamp.date_naive() })
        .into_values()
        .flat_map(|(hi, lo)| {
            [
                extreme_zone(&candles[hi], candles[hi].high, LiquidityKind::DailyHigh),
                extreme_zone(&candles[lo], candles[lo].low, LiquidityKind::DailyLow),
            ]
        })
        .collect()
}

/// Concatenate zone groups and sort by level (stable).
pub fn merge_zones(groups: Vec<Vec<LiquidityZone>>) -> Vec<LiquidityZone> {
    let mut merged: Vec<LiquidityZone> = groups.into_iter().flatten().collect();
    merged.sort_by(|a, b| a.level.total_cmp(&b.level));
    merged
}

/// Equal highs/lows, daily extremes and session extremes, sorted by level.
pub fn detect_liquidity(candles: &[Candle], lookback: usize, tolerance: f64) -> Vec<LiquidityZone> {
    merge_zones(vec![
        detect_equal_highs_lows(candles, lookback, tolerance),
        daily_levels(candles),
        session_high_low(candles),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_candles;
    use chrono::TimeZone;

    #[test]
    fn equal_highs_cluster() {
        // Highs touch 110 repeatedly; lows drift upward so no equal lows.
        let mut data = Vec::new();
        for i in 0..8 {
            let high = if i % 2 == 1 { 110.0 } else { 108.0 };
            let low = 100.0 + i as f64 * 0.5;
            data.push((low + 1.0, high, low, low + 2.0));
        }
        let zones = detect_equal_highs_lows(&make_ohlc_candles(&data), 4, 0.0005);
        assert_eq!(zones.len(), 1);
        let zone = &zones[0];
        assert_eq!(zone.kind, LiquidityKind::EqualHigh);
        assert!((zone.level - 110.0).abs() < 1e-9);
        assert!(zone.touches >= 2);
        assert!(zone.end >= zone.start);
    }

    #[test]
    fn grouping_uses_weighted_mean() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let zones = group_levels(
            &[(ts, 100.0), (ts, 100.03), (ts, 120.0)],
            0.0005,
            LiquidityKind::EqualLow,
        );
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].touches, 3);
        assert!((zones[0].level - (100.0 * 2.0 + 100.03) / 3.0).abs() < 1e-9);
        assert_eq!(zones[1].touches, 2);
    }

    #[test]
    fn lookback_below_two_yields_nothing() {
        let candles = make_ohlc_candles(&[(1.0, 2.0, 0.5, 1.5); 5]);
        assert!(detect_equal_highs_lows(&candles, 1, 0.0005).is_empty());
    }

    #[test]
    fn session_and_daily_extremes() {
        // 15-minute bars from 00:00 cover Asia (00:00–06:45) and Europe (07:00–).
        let data: Vec<(f64, f64, f64, f64)> = (0..40)
            .map(|i| {
                let mid = 100.0 + (i as f64 * 0.7).sin() * 3.0;
                (mid, mid + 1.0, mid - 1.0, mid)
            })
            .collect();
        let candles = make_ohlc_candles(&data);
        let sessions = session_high_low(&candles);
        let kinds: Vec<String> = sessions.iter().map(|z| z.kind.to_string()).collect();
        assert_eq!(kinds, vec!["asia_high", "asia_low", "europe_high", "europe_low"]);
        assert!(sessions.iter().all(|z| z.touches == 1));

        let daily = daily_levels(&candles);
        assert_eq!(daily.len(), 2);
        let max_high = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        assert_eq!(daily[0].level, max_high);
    }

    #[test]
    fn merged_zones_sorted_by_level() {
        let data: Vec<(f64, f64, f64, f64)> = (0..60)
            .map(|i| {
                let mid = 100.0 + (i as f64 * 0.4).sin() * 2.0;
                (mid, mid + 0.5, mid - 0.5, mid)
            })
            .collect();
        let zones = detect_liquidity(&make_ohlc_candles(&data), 20, 0.0005);
        assert!(!zones.is_empty());
        for pair in zones.windows(2) {
            assert!(pair[0].level <= pair[1].level);
        }
    }

    #[test]
    fn kind_serializes_as_string() {
        let json = serde_json::to_string(&LiquidityKind::SessionHigh(Session::Europe)).unwrap();
        assert_eq!(json, "\"europe_high\"");
        let back: LiquidityKind = serde_json::from_str("\"daily_low\"").unwrap();
        assert_eq!(back, LiquidityKind::DailyLow);
    }
}

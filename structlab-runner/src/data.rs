//! Candle bundles for backtests.
//!
//! A `CandleBundle` holds one symbol's candles on every timeframe and cuts
//! trailing windows out of them. Candles come from a `CandleSource`; the
//! runner ships an in-memory source and callers plug in their own stores.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use thiserror::Error;

use structlab_core::domain::{Candle, CandlesByTimeframe};
use structlab_core::DataError;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no candles for '{symbol}' on timeframe '{timeframe}'")]
    NoCandles { symbol: String, timeframe: String },

    #[error("source '{source_name}' failed: {reason}")]
    Source { source_name: String, reason: String },
}

/// Anything that can hand out candles for a symbol and timeframe.
pub trait CandleSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Up to `limit` of the most recent candles.
    fn fetch(&self, symbol: &str, timeframe: &str, limit: Option<usize>) -> Result<Vec<Candle>, LoadError>;
}

/// Source backed by candles already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    candles: BTreeMap<(String, String), Vec<Candle>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add candles; each series is kept in timestamp order.
    pub fn insert(&mut self, symbol: &str, timeframe: &str, candles: Vec<Candle>) {
        let series = self
            .candles
            .entry((symbol.to_string(), timeframe.to_string()))
            .or_default();
        series.extend(candles);
        series.sort_by_key(|c| c.timestamp);
    }
}

impl CandleSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, symbol: &str, timeframe: &str, limit: Option<usize>) -> Result<Vec<Candle>, LoadError> {
        let all = self
            .candles
            .get(&(symbol.to_string(), timeframe.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let skip = limit.map_or(0, |l| all.len().saturating_sub(l));
        Ok(all[skip..].to_vec())
    }
}

/// One symbol's candles across timeframes.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleBundle {
    pub symbol: String,
    pub candles: CandlesByTimeframe,
}

impl CandleBundle {
    pub fn new(symbol: impl Into<String>, candles: CandlesByTimeframe) -> Self {
        Self {
            symbol: symbol.into(),
            candles,
        }
    }

    pub fn timeframe(&self, timeframe: &str) -> Option<&[Candle]> {
        self.candles.get(timeframe).map(Vec::as_slice)
    }

    /// Every timeframe cut to candles at or before `end`, keeping at most the
    /// last `lookback` of them (`0` keeps all).
    ///
    /// Fails when a timeframe has nothing at or before `end`.
    pub fn window(&self, end: DateTime<Utc>, lookback: usize) -> Result<CandlesByTimeframe, DataError> {
        let mut out = CandlesByTimeframe::new();
        for (timeframe, series) in &self.candles {
            let stop = series.partition_point(|c| c.timestamp <= end);
            if stop == 0 {
                return Err(DataError::EmptyWindow {
                    timeframe: timeframe.clone(),
                    end: end.to_rfc3339_opts(SecondsFormat::Secs, true),
                });
            }
            let start = if lookback > 0 { stop.saturating_sub(lookback) } else { 0 };
            out.insert(timeframe.clone(), series[start..stop].to_vec());
        }
        Ok(out)
    }
}

/// Fetch every timeframe for `symbol`, sorted by timestamp with duplicate
/// timestamps dropped (first wins) and trimmed to the last `limit` candles.
pub fn load_bundle(
    source: &dyn CandleSource,
    symbol: &str,
    timeframes: &[String],
    limit: Option<usize>,
) -> Result<CandleBundle, LoadError> {
    let mut candles = CandlesByTimeframe::new();
    for timeframe in timeframes {
        let mut series = source.fetch(symbol, timeframe, limit)?;
        series.sort_by_key(|c| c.timestamp);
        series.dedup_by_key(|c| c.timestamp);
        if let Some(limit) = limit {
            let skip = series.len().saturating_sub(limit);
            series.drain(..skip);
        }
        if series.is_empty() {
            return Err(LoadError::NoCandles {
                symbol: symbol.to_string(),
                timeframe: timeframe.clone(),
            });
        }
        tracing::debug!(source = source.name(), symbol, timeframe = %timeframe, bars = series.len(), "loaded");
        candles.insert(timeframe.clone(), series);
    }
    Ok(CandleBundle::new(symbol, candles))
}

/// Most common spacing between consecutive candles. Ties go to the shorter spacing.
pub fn infer_bar_interval(candles: &[Candle]) -> Option<Duration> {
    let mut counts: BTreeMap<Duration, usize> = BTreeMap::new();
    for pair in candles.windows(2) {
        *counts.entry(pair[1].timestamp - pair[0].timestamp).or_default() += 1;
    }
    let mut best: Option<(Duration, usize)> = None;
    for (spacing, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((spacing, count));
        }
    }
    best.map(|(spacing, _)| spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(minute: i64, close: f64) -> Candle {
        Candle {
            symbol: "BTC".into(),
            timeframe: "15m".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::minutes(minute),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000.0,
            source: "test".into(),
        }
    }

    fn bundle() -> CandleBundle {
        let fast: Vec<Candle> = (0..8).map(|i| candle(15 * i, 100.0 + i as f64)).collect();
        let slow: Vec<Candle> = (0..2).map(|i| candle(60 * i, 100.0)).collect();
        CandleBundle::new(
            "BTC",
            [("15m".to_string(), fast), ("1h".to_string(), slow)].into_iter().collect(),
        )
    }

    #[test]
    fn window_is_inclusive_and_trimmed() {
        let b = bundle();
        let end = b.candles["15m"][5].timestamp;
        let w = b.window(end, 3).unwrap();
        let closes: Vec<f64> = w["15m"].iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![103.0, 104.0, 105.0]);
        assert_eq!(w["1h"].len(), 2);
    }

    #[test]
    fn zero_lookback_keeps_history() {
        let b = bundle();
        let end = b.candles["15m"][5].timestamp;
        assert_eq!(b.window(end, 0).unwrap()["15m"].len(), 6);
    }

    #[test]
    fn window_before_data_fails() {
        let b = bundle();
        let end = b.candles["15m"][0].timestamp - Duration::minutes(1);
        assert!(matches!(b.window(end, 10), Err(DataError::EmptyWindow { .. })));
    }

    #[test]
    fn load_sorts_dedupes_and_limits() {
        let mut source = InMemorySource::new();
        source.insert("BTC", "15m", vec![candle(30, 3.0), candle(0, 1.0), candle(15, 2.0), candle(15, 9.0)]);
        let b = load_bundle(&source, "BTC", &["15m".to_string()], None).unwrap();
        let closes: Vec<f64> = b.candles["15m"].iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);

        let limited = load_bundle(&source, "BTC", &["15m".to_string()], Some(2)).unwrap();
        assert_eq!(limited.candles["15m"].len(), 2);
    }

    #[test]
    fn missing_timeframe_fails_to_load() {
        let source = InMemorySource::new();
        assert!(matches!(
            load_bundle(&source, "BTC", &["1h".to_string()], None),
            Err(LoadError::NoCandles { .. })
        ));
    }

    #[test]
    fn modal_interval() {
        let candles = vec![candle(0, 1.0), candle(15, 1.0), candle(30, 1.0), candle(90, 1.0), candle(105, 1.0)];
        assert_eq!(infer_bar_interval(&candles), Some(Duration::minutes(15)));
        assert_eq!(infer_bar_interval(&candles[..1]), None);
    }
}

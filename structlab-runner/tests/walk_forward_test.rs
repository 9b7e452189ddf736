//! Integration tests for the walk-forward backtester.
//!
//! Tests:
//! 1. Signal simulation: stop, target and forward-end outcomes
//! 2. Stop check precedes target check on the same bar
//! 3. Parallel and sequential runs agree
//! 4. Cancellation and skipped steps are reported
//! 5. Metrics over a run and over no trades

use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Duration, TimeZone, Utc};
use structlab_core::domain::{Candle, CandlesByTimeframe, Side, SignalId, TradingSignal};
use structlab_core::{AnalysisConfig, AnalyzeAssetPipeline};
use structlab_runner::{
    evaluate_signal, summarize, BacktestMetrics, CandleBundle, TradeOutcome, WalkForwardBacktester,
    WalkForwardConfig, WalkForwardError,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 0).unwrap()
}

fn bar(ts: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        symbol: "BTCUSDT".into(),
        timeframe: "15m".into(),
        timestamp: ts,
        open,
        high,
        low,
        close,
        volume: 5_000_000.0,
        source: "synthetic".into(),
    }
}

/// Closes starting at `start`, stepping `step` per bar; high/low = close ± `wick`.
fn drifting(n: usize, start: f64, step: f64, wick: f64) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = start + step * (i + 1) as f64;
            bar(base() + Duration::minutes(15 * i as i64), close - step, close + wick, close - wick, close)
        })
        .collect()
}

/// Oscillating series with a slow drift, spaced `minutes` apart from `from`.
fn wave(n: usize, minutes: i64, from: DateTime<Utc>) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.15).sin() * 6.0 + (t * 0.04).cos() * 3.0 + t * 0.02;
            let open = close - (t * 0.7).sin();
            let spread = 0.6 + (t * 0.11).cos().abs();
            bar(
                from + Duration::minutes(minutes * i as i64),
                open,
                open.max(close) + spread,
                open.min(close) - spread,
                close,
            )
        })
        .collect()
}

fn signal(side: Side, entry: f64, stop: f64, targets: Vec<f64>) -> TradingSignal {
    TradingSignal {
        id: SignalId::derive("BTCUSDT", "15m", base(), side),
        symbol: "BTCUSDT".into(),
        timeframe: "15m".into(),
        direction: side,
        entry,
        stop_loss: stop,
        take_profits: targets,
        rr: 1.0,
        score: 0.8,
        reasons: Vec::new(),
        overlays: Vec::new(),
        created_at: base(),
    }
}

fn lenient_pipeline() -> AnalyzeAssetPipeline {
    AnalyzeAssetPipeline::new(AnalysisConfig {
        timeframes: vec!["1h".into(), "15m".into()],
        execution_timeframe: "15m".into(),
        min_score: 0.0,
        min_rr: 0.0,
        min_volume: 0.0,
        ..AnalysisConfig::default()
    })
    .unwrap()
}

fn bundle(hourly_from: DateTime<Utc>) -> CandleBundle {
    let candles: CandlesByTimeframe = [
        ("15m".to_string(), wave(400, 15, base())),
        ("1h".to_string(), wave(120, 60, hourly_from)),
    ]
    .into_iter()
    .collect();
    CandleBundle::new("BTCUSDT", candles)
}

fn wf_config(parallel: bool) -> WalkForwardConfig {
    WalkForwardConfig {
        lookback: 120,
        forward: 20,
        step: 15,
        parallel,
    }
}

// ── Simulation ───────────────────────────────────────────────────────

#[test]
fn long_reaches_first_target_on_fourth_bar() {
    // Closes 100, 101.5, 103, 104.5 ...; highs at close + 0.8 first reach 105 on bar 4.
    let forward: Vec<Candle> = (0..10)
        .map(|i| {
            let close = 100.0 + 1.5 * i as f64;
            bar(base() + Duration::minutes(15 * i as i64), close - 0.5, close + 0.8, close - 0.8, close)
        })
        .collect();
    let trade = evaluate_signal(&signal(Side::Long, 100.0, 95.0, vec![105.0]), &forward).unwrap();
    assert_eq!(trade.outcome, TradeOutcome::Target);
    assert!((trade.rr_realized - 1.0).abs() < 1e-12);
    assert_eq!(trade.entry_time, forward[0].timestamp);
    assert_eq!(trade.exit_time, forward[3].timestamp);
    assert!((trade.max_favorable - 5.3).abs() < 1e-9);
    assert!((trade.max_adverse - 0.8).abs() < 1e-9);
}

#[test]
fn stop_is_minus_one() {
    let forward = drifting(10, 100.0, -1.5, 0.8);
    let trade = evaluate_signal(&signal(Side::Long, 100.0, 95.0, vec![110.0]), &forward).unwrap();
    assert_eq!(trade.outcome, TradeOutcome::Stop);
    assert_eq!(trade.rr_realized, -1.0);
    assert!(trade.max_adverse >= 5.0);
}

#[test]
fn short_mirrors_long() {
    let forward = drifting(10, 100.0, -1.5, 0.8);
    let trade = evaluate_signal(&signal(Side::Short, 100.0, 105.0, vec![95.0, 90.0]), &forward).unwrap();
    assert_eq!(trade.outcome, TradeOutcome::Target);
    assert!((trade.rr_realized - 1.0).abs() < 1e-12);
}

#[test]
fn stop_checked_before_target_on_same_bar() {
    let forward = vec![bar(base(), 100.0, 120.0, 90.0, 100.0)];
    let trade = evaluate_signal(&signal(Side::Long, 100.0, 95.0, vec![105.0]), &forward).unwrap();
    assert_eq!(trade.outcome, TradeOutcome::Stop);
}

#[test]
fn quiet_window_ends_flat() {
    let forward = drifting(5, 100.0, 0.0, 0.5);
    let trade = evaluate_signal(&signal(Side::Long, 100.0, 95.0, vec![105.0]), &forward).unwrap();
    assert_eq!(trade.outcome, TradeOutcome::ForwardEnd);
    assert_eq!(trade.rr_realized, 0.0);
    assert_eq!(trade.exit_time, forward[4].timestamp);
}

#[test]
fn empty_forward_window_yields_nothing() {
    assert!(evaluate_signal(&signal(Side::Long, 100.0, 95.0, vec![105.0]), &[]).is_none());
}

// ── Backtester ───────────────────────────────────────────────────────

#[test]
fn parallel_matches_sequential() {
    let data = bundle(base());
    let sequential = WalkForwardBacktester::new(lenient_pipeline(), wf_config(false))
        .unwrap()
        .run(&data)
        .unwrap();
    let parallel = WalkForwardBacktester::new(lenient_pipeline(), wf_config(true))
        .unwrap()
        .run(&data)
        .unwrap();

    assert_eq!(sequential.trades, parallel.trades);
    assert_eq!(sequential.steps_evaluated, parallel.steps_evaluated);
    // (400 - 20 - 120) / 15 rounded up
    assert_eq!(sequential.steps_evaluated + sequential.steps_skipped, 18);
    assert!(sequential.trades.windows(2).all(|w| w[0].entry_time <= w[1].entry_time));
    assert!(!sequential.cancelled);
    assert!(sequential.finished_at >= sequential.started_at);
}

#[test]
fn windows_before_higher_timeframe_data_are_skipped() {
    // Hourly data starts 50 hours in, i.e. at execution bar 200.
    let data = bundle(base() + Duration::hours(50));
    let result = WalkForwardBacktester::new(lenient_pipeline(), wf_config(false))
        .unwrap()
        .run(&data)
        .unwrap();
    // Points 120, 135, ..., 195 precede the first hourly bar.
    assert_eq!(result.steps_skipped, 6);
    assert_eq!(result.steps_evaluated, 12);
}

#[test]
fn cancellation_stops_between_steps() {
    let data = bundle(base());
    let flag = AtomicBool::new(true);
    for parallel in [false, true] {
        let result = WalkForwardBacktester::new(lenient_pipeline(), wf_config(parallel))
            .unwrap()
            .run_with_cancel(&data, Some(&flag))
            .unwrap();
        assert!(result.cancelled);
        assert!(result.trades.is_empty());
        assert_eq!(result.steps_evaluated, 0);
    }
}

#[test]
fn missing_execution_series_is_an_error() {
    let candles: CandlesByTimeframe = [("1h".to_string(), wave(50, 60, base()))].into_iter().collect();
    let err = WalkForwardBacktester::new(lenient_pipeline(), wf_config(false))
        .unwrap()
        .run(&CandleBundle::new("BTCUSDT", candles))
        .unwrap_err();
    assert!(matches!(err, WalkForwardError::MissingExecutionTimeframe { .. }));
}

#[test]
fn invalid_walk_forward_config_rejected() {
    let config = WalkForwardConfig {
        forward: 0,
        ..WalkForwardConfig::default()
    };
    assert!(matches!(
        WalkForwardBacktester::new(lenient_pipeline(), config),
        Err(WalkForwardError::Configuration(_))
    ));
}

// ── Metrics ──────────────────────────────────────────────────────────

#[test]
fn summarize_empty_is_zeroed() {
    assert_eq!(summarize(&[]), BacktestMetrics::default());
    let m = summarize(&[]);
    assert_eq!(m.total_trades, 0);
    assert_eq!(m.win_rate, 0.0);
    assert_eq!(m.expectancy, 0.0);
}

#[test]
fn summarize_mixed_outcomes() {
    let up = drifting(10, 100.0, 1.5, 0.8);
    let down = drifting(10, 100.0, -1.5, 0.8);
    let flat = drifting(5, 100.0, 0.0, 0.5);
    let long = signal(Side::Long, 100.0, 95.0, vec![105.0]);
    let trades = vec![
        evaluate_signal(&long, &up).unwrap(),
        evaluate_signal(&long, &down).unwrap(),
        evaluate_signal(&long, &flat).unwrap(),
    ];
    let m = summarize(&trades);
    assert_eq!(m.total_trades, 3);
    assert!((m.win_rate - 1.0 / 3.0).abs() < 1e-12);
    // avg over decided trades (1.0, -1.0); expectancy over all three.
    assert!(m.avg_rr.abs() < 1e-12);
    assert!(m.expectancy.abs() < 1e-12);
    assert!(m.max_favorable >= 5.3 - 1e-9);
    assert!(m.max_adverse >= 5.0);
}

#[test]
fn run_metrics_match_summarize() {
    let result = WalkForwardBacktester::new(lenient_pipeline(), wf_config(false))
        .unwrap()
        .run(&bundle(base()))
        .unwrap();
    assert_eq!(result.metrics(), summarize(&result.trades));
}

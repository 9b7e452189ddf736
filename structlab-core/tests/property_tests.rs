//! Property tests for structure, risk, scoring and post-filter invariants.
//!
//! Uses proptest to verify:
//! 1. Swings alternate high/low and are ordered by bar index
//! 2. Fewer than three swings never produce structure events; every CHOCH
//!    reverses the trend left by the preceding event
//! 3. Profitable targets give a positive RR; non-positive prices are rejected
//! 4. Score totals stay in [0, 1] with bounded bonuses and non-negative penalties
//! 5. Deduplicated signals respect the cooldown within each group

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use structlab_core::domain::{Candle, RegimeLabel, Side, SignalId, StructureKind, TradingSignal};
use structlab_core::pipeline::{calibrate_score, ScoreInputs};
use structlab_core::risk::compute_rr;
use structlab_core::signals::deduplicate;
use structlab_core::structure::{compute_swings, detect_structure};

// ── Helpers ──────────────────────────────────────────────────────────

fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                symbol: "TEST".into(),
                timeframe: "15m".into(),
                timestamp: base + Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
                source: "synthetic".into(),
            }
        })
        .collect()
}

fn signal_at(symbol: &str, side: Side, minute: i64) -> TradingSignal {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::minutes(minute);
    TradingSignal {
        id: SignalId::derive(symbol, "15m", created_at, side),
        symbol: symbol.into(),
        timeframe: "15m".into(),
        direction: side,
        entry: 100.0,
        stop_loss: 95.0,
        take_profits: vec![110.0],
        rr: 2.0,
        score: 0.7,
        reasons: Vec::new(),
        overlays: Vec::new(),
        created_at,
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-3.0..3.0_f64, 2..200).prop_map(|steps| {
        let mut price = 500.0;
        steps
            .into_iter()
            .map(|s| {
                price += s;
                price
            })
            .collect()
    })
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Long), Just(Side::Short)]
}

// ── 1–2. Swings and structure ────────────────────────────────────────

proptest! {
    #[test]
    fn swings_alternate(closes in arb_closes(), multiplier in 0.5..3.0_f64) {
        let candles = candles_from_closes(&closes);
        let swings = compute_swings(&candles, 14, multiplier);
        prop_assert!(!swings.is_empty());
        prop_assert_eq!(swings[0].index, 0);
        for pair in swings.windows(2) {
            prop_assert_ne!(pair[0].kind, pair[1].kind);
            prop_assert!(pair[0].index <= pair[1].index);
        }
    }

    #[test]
    fn monotonic_series_alternates(n in 20usize..150, step in 0.5..5.0_f64) {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + step * i as f64).collect();
        let swings = compute_swings(&candles_from_closes(&closes), 14, 1.5);
        for pair in swings.windows(2) {
            prop_assert_ne!(pair[0].kind, pair[1].kind);
        }
    }

    #[test]
    fn short_swing_lists_have_no_events(closes in arb_closes(), keep in 0usize..3) {
        let swings = compute_swings(&candles_from_closes(&closes), 14, 1.0);
        let truncated = &swings[..keep.min(swings.len())];
        prop_assert!(detect_structure(truncated, 1e-6).is_empty());
    }

    #[test]
    fn events_follow_swing_order(closes in arb_closes()) {
        let swings = compute_swings(&candles_from_closes(&closes), 14, 1.0);
        let events = detect_structure(&swings, 1e-6);
        for pair in events.windows(2) {
            prop_assert!(pair[0].swing_index < pair[1].swing_index);
        }
    }

    #[test]
    fn choch_reverses_tracked_trend(closes in arb_closes(), multiplier in 0.5..2.0_f64) {
        let swings = compute_swings(&candles_from_closes(&closes), 14, multiplier);
        let events = detect_structure(&swings, 1e-6);
        if let Some(first) = events.first() {
            prop_assert!(first.is_bos());
        }
        for pair in events.windows(2) {
            if pair[1].kind == StructureKind::Choch {
                prop_assert_eq!(pair[1].direction, pair[0].direction.opposite());
            }
        }
    }
}

// ── 3. Risk/reward ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn profitable_targets_give_positive_rr(
        entry in 10.0..1000.0_f64,
        risk_pct in 0.001..0.2_f64,
        reward_pct in 0.001..0.5_f64,
        side in arb_side(),
    ) {
        let (stop, target) = match side {
            Side::Long => (entry * (1.0 - risk_pct), entry * (1.0 + reward_pct)),
            Side::Short => (entry * (1.0 + risk_pct), entry * (1.0 - reward_pct)),
        };
        let result = compute_rr(side, entry, stop, vec![target]).unwrap();
        prop_assert!(result.rr > 0.0);
    }

    #[test]
    fn non_positive_prices_rejected(entry in -1000.0..=0.0_f64, stop in 1.0..100.0_f64, side in arb_side()) {
        prop_assert!(compute_rr(side, entry, stop, vec![50.0]).is_err());
        prop_assert!(compute_rr(side, stop, entry, vec![50.0]).is_err());
    }
}

// ── 4. Scoring ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_bounded(
        flags in prop::array::uniform5(any::<bool>()),
        zones in 0usize..5,
        rr in 0.0..5.0_f64,
        vol in 0.0..100.0_f64,
        trending in any::<bool>(),
    ) {
        let inputs = ScoreInputs {
            bos: flags[0],
            fvg: flags[1],
            turtle: flags[2],
            divergence: flags[3],
            order_block: flags[4],
            liquidity_zones: zones,
            rr,
            volatility_percentile: vol,
        };
        let label = if trending { RegimeLabel::Trending } else { RegimeLabel::Ranging };
        let score = calibrate_score(&inputs, label);
        prop_assert!((0.0..=1.0).contains(&score.total()));
        prop_assert!(score.confluence_bonus <= 1.0);
        prop_assert!(score.penalty >= 0.0);
    }
}

// ── 5. Post-filter ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn dedup_respects_cooldown(
        minutes in prop::collection::vec((0i64..600, any::<bool>()), 0..40),
        window in 0i64..30,
    ) {
        let signals: Vec<TradingSignal> = minutes
            .iter()
            .map(|&(m, long)| signal_at("BTC", if long { Side::Long } else { Side::Short }, m))
            .collect();
        let input_len = signals.len();
        let kept = deduplicate(signals, window);
        prop_assert!(kept.len() <= input_len);
        for side in [Side::Long, Side::Short] {
            let group: Vec<&TradingSignal> = kept.iter().filter(|s| s.direction == side).collect();
            for pair in group.windows(2) {
                prop_assert!((pair[1].created_at - pair[0].created_at).num_minutes() >= window);
            }
        }
    }
}

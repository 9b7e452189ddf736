//! Backtest metrics: pure functions over simulated trades.
//!
//! Every metric is a pure function: trade list in, scalar out. An empty
//! trade list yields 0.0 everywhere.

use serde::{Deserialize, Serialize};

use crate::walk_forward::{BacktestTrade, TradeOutcome};

/// Aggregate statistics for one walk-forward run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub total_trades: usize,
    pub win_rate: f64,
    /// Mean realized RR over trades that closed at a stop or target.
    pub avg_rr: f64,
    /// Mean realized RR over all trades.
    pub expectancy: f64,
    pub max_adverse: f64,
    pub max_favorable: f64,
}

pub fn summarize(trades: &[BacktestTrade]) -> BacktestMetrics {
    if trades.is_empty() {
        return BacktestMetrics::default();
    }
    BacktestMetrics {
        total_trades: trades.len(),
        win_rate: win_rate(trades),
        avg_rr: average_rr(trades),
        expectancy: expectancy(trades),
        max_adverse: trades.iter().map(|t| t.max_adverse).fold(0.0, f64::max),
        max_favorable: trades.iter().map(|t| t.max_favorable).fold(0.0, f64::max),
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of trades that reached a target.
pub fn win_rate(trades: &[BacktestTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.outcome == TradeOutcome::Target).count();
    wins as f64 / trades.len() as f64
}

/// Mean of the non-zero realized RRs.
pub fn average_rr(trades: &[BacktestTrade]) -> f64 {
    let decided: Vec<f64> = trades
        .iter()
        .map(|t| t.rr_realized)
        .filter(|rr| *rr != 0.0)
        .collect();
    if decided.is_empty() {
        return 0.0;
    }
    decided.iter().sum::<f64>() / decided.len() as f64
}

pub fn expectancy(trades: &[BacktestTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.rr_realized).sum::<f64>() / trades.len() as f64
}

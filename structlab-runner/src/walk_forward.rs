//! Walk-forward backtesting: replay the pipeline over history and simulate
//! every emitted signal on the bars that follow.
//!
//! For each evaluation index `idx` in `[lookback, len - forward)` stepping by
//! `step` on the execution timeframe, every timeframe is cut to a trailing
//! window ending at the execution bar's timestamp, the pipeline runs on that
//! window and each signal is simulated over bars `idx + 1 ..= idx + forward`.
//!
//! Steps are independent, so the parallel mode fans them out with rayon and
//! re-sorts the output; results match the sequential mode exactly.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use structlab_core::domain::{Candle, Side, TradingSignal};
use structlab_core::{AnalysisError, AnalyzeAssetPipeline, ConfigurationError};

use crate::data::CandleBundle;
use crate::metrics::{summarize, BacktestMetrics};

/// Floor for the risk distance when converting a target hit into RR.
const MIN_RISK: f64 = 1e-9;

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkForwardConfig {
    /// Bars of trailing context per timeframe (default 400).
    pub lookback: usize,
    /// Bars simulated after each evaluation point (default 40).
    pub forward: usize,
    /// Stride between evaluation points (default 5).
    pub step: usize,
    /// Evaluate steps on the rayon pool.
    pub parallel: bool,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            lookback: 400,
            forward: 40,
            step: 5,
            parallel: false,
        }
    }
}

impl WalkForwardConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in [
            ("walk_forward.lookback", self.lookback),
            ("walk_forward.forward", self.forward),
            ("walk_forward.step", self.step),
        ] {
            if value == 0 {
                return Err(ConfigurationError::InvalidParameter {
                    name,
                    reason: "must be >= 1".into(),
                });
            }
        }
        Ok(())
    }
}

// ─── Result types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOutcome {
    Target,
    Stop,
    ForwardEnd,
}

/// One simulated signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub signal: TradingSignal,
    /// Timestamp of the first simulated bar.
    pub entry_time: DateTime<Utc>,
    /// Timestamp of the bar that closed the trade (or the last simulated bar).
    pub exit_time: DateTime<Utc>,
    pub outcome: TradeOutcome,
    pub rr_realized: f64,
    pub max_adverse: f64,
    pub max_favorable: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    /// Sorted by entry time.
    pub trades: Vec<BacktestTrade>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps_evaluated: usize,
    /// Steps whose window could not be analysed.
    pub steps_skipped: usize,
    pub cancelled: bool,
}

impl WalkForwardResult {
    pub fn metrics(&self) -> BacktestMetrics {
        summarize(&self.trades)
    }

    /// Pretty JSON with trades, run bounds and step counts.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("bundle for '{symbol}' has no '{timeframe}' candles")]
    MissingExecutionTimeframe { symbol: String, timeframe: String },

    #[error("analysis failed at {at}: {source}")]
    Analysis {
        at: DateTime<Utc>,
        #[source]
        source: AnalysisError,
    },
}

// ─── Simulation ──────────────────────────────────────────────────────

/// Simulate `signal` over `forward` bars.
///
/// Per bar: excursions are updated first, then the stop is checked, then
/// targets in listed order. A stop is RR -1; a target is its reward over
/// the entry-stop distance; running out of bars is RR 0. Returns `None` for
/// an empty forward window or a signal without targets.
pub fn evaluate_signal(signal: &TradingSignal, forward: &[Candle]) -> Option<BacktestTrade> {
    let first = forward.first()?;
    if signal.take_profits.is_empty() {
        return None;
    }

    let entry = signal.entry;
    let stop = signal.stop_loss;
    let mut max_favorable: f64 = 0.0;
    let mut max_adverse: f64 = 0.0;
    let mut exit_time = first.timestamp;
    let mut outcome = TradeOutcome::ForwardEnd;
    let mut rr_realized = 0.0;

    for candle in forward {
        exit_time = candle.timestamp;
        let (favorable, adverse, stopped) = match signal.direction {
            Side::Long => (candle.high - entry, entry - candle.low, candle.low <= stop),
            Side::Short => (entry - candle.low, candle.high - entry, candle.high >= stop),
        };
        max_favorable = max_favorable.max(favorable);
        max_adverse = max_adverse.max(adverse.max(0.0));

        if stopped {
            outcome = TradeOutcome::Stop;
            rr_realized = -1.0;
            break;
        }
        let hit = signal.take_profits.iter().find(|&&target| match signal.direction {
            Side::Long => candle.high >= target,
            Side::Short => candle.low <= target,
        });
        if let Some(&target) = hit {
            rr_realized = match signal.direction {
                Side::Long => (target - entry) / (entry - stop).max(MIN_RISK),
                Side::Short => (entry - target) / (stop - entry).max(MIN_RISK),
            };
            outcome = TradeOutcome::Target;
            break;
        }
    }

    Some(BacktestTrade {
        signal: signal.clone(),
        entry_time: first.timestamp,
        exit_time,
        outcome,
        rr_realized,
        max_adverse,
        max_favorable,
    })
}

// ─── Backtester ──────────────────────────────────────────────────────

enum StepOutcome {
    Trades(Vec<BacktestTrade>),
    Skipped,
    Cancelled,
    Failed(WalkForwardError),
}

pub struct WalkForwardBacktester {
    pipeline: AnalyzeAssetPipeline,
    config: WalkForwardConfig,
}

impl WalkForwardBacktester {
    pub fn new(pipeline: AnalyzeAssetPipeline, config: WalkForwardConfig) -> Result<Self, WalkForwardError> {
        config.validate()?;
        Ok(Self { pipeline, config })
    }

    pub fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    /// Evaluation indices on the execution timeframe.
    pub fn evaluation_points(&self, exec_len: usize) -> Vec<usize> {
        let end = exec_len.saturating_sub(self.config.forward);
        (self.config.lookback..end).step_by(self.config.step).collect()
    }

    pub fn run(&self, bundle: &CandleBundle) -> Result<WalkForwardResult, WalkForwardError> {
        self.run_with_cancel(bundle, None)
    }

    /// Run the walk-forward loop; `cancel` is checked before each step.
    ///
    /// Steps whose window cannot be built or whose timeframes are missing are
    /// skipped and logged. Configuration failures abort the run.
    pub fn run_with_cancel(
        &self,
        bundle: &CandleBundle,
        cancel: Option<&AtomicBool>,
    ) -> Result<WalkForwardResult, WalkForwardError> {
        let started_at = Utc::now();
        let exec_tf = &self.pipeline.config().execution_timeframe;
        let exec = bundle
            .timeframe(exec_tf)
            .ok_or_else(|| WalkForwardError::MissingExecutionTimeframe {
                symbol: bundle.symbol.clone(),
                timeframe: exec_tf.clone(),
            })?;

        let points = self.evaluation_points(exec.len());
        info!(
            symbol = %bundle.symbol,
            bars = exec.len(),
            steps = points.len(),
            parallel = self.config.parallel,
            "walk-forward started"
        );

        let outcomes: Vec<StepOutcome> = if self.config.parallel {
            points
                .par_iter()
                .map(|&idx| self.step(bundle, exec, idx, cancel))
                .collect()
        } else {
            let mut outcomes = Vec::with_capacity(points.len());
            for &idx in &points {
                let outcome = self.step(bundle, exec, idx, cancel);
                let stop = matches!(outcome, StepOutcome::Cancelled | StepOutcome::Failed(_));
                outcomes.push(outcome);
                if stop {
                    break;
                }
            }
            outcomes
        };

        let mut trades = Vec::new();
        let mut steps_evaluated = 0;
        let mut steps_skipped = 0;
        let mut cancelled = false;
        for outcome in outcomes {
            match outcome {
                StepOutcome::Trades(step_trades) => {
                    steps_evaluated += 1;
                    trades.extend(step_trades);
                }
                StepOutcome::Skipped => steps_skipped += 1,
                StepOutcome::Cancelled => cancelled = true,
                StepOutcome::Failed(err) => return Err(err),
            }
        }
        trades.sort_by_key(|t| t.entry_time);

        let finished_at = Utc::now();
        info!(
            symbol = %bundle.symbol,
            trades = trades.len(),
            steps_evaluated,
            steps_skipped,
            cancelled,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "walk-forward finished"
        );
        Ok(WalkForwardResult {
            trades,
            started_at,
            finished_at,
            steps_evaluated,
            steps_skipped,
            cancelled,
        })
    }

    fn step(&self, bundle: &CandleBundle, exec: &[Candle], idx: usize, cancel: Option<&AtomicBool>) -> StepOutcome {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return StepOutcome::Cancelled;
        }
        let at = exec[idx].timestamp;
        let window = match bundle.window(at, self.config.lookback) {
            Ok(window) => window,
            Err(err) => {
                warn!(%at, error = %err, "step skipped");
                return StepOutcome::Skipped;
            }
        };
        let signals = match self.pipeline.run(&bundle.symbol, &window) {
            Ok(signals) => signals,
            Err(AnalysisError::Data(err)) => {
                warn!(%at, error = %err, "step skipped");
                return StepOutcome::Skipped;
            }
            Err(source) => return StepOutcome::Failed(WalkForwardError::Analysis { at, source }),
        };

        let end = (idx + 1 + self.config.forward).min(exec.len());
        let forward = &exec[idx + 1..end];
        let trades: Vec<BacktestTrade> = signals
            .iter()
            .filter_map(|signal| evaluate_signal(signal, forward))
            .collect();
        debug!(%at, signals = signals.len(), trades = trades.len(), "step evaluated");
        StepOutcome::Trades(trades)
    }
}

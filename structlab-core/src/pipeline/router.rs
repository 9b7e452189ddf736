//! Ensemble router: turns per-timeframe analyses into one execution context.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::engine::{MultiTimeframeContext, TimeframeAnalysis};
use crate::domain::{Direction, RegimeLabel, Side};
use crate::error::DataError;
use crate::risk::RiskResult;
use crate::signals::{RegimeSummary, SignalContext};
use crate::structure::{FairValueGap, LiquidityZone, OrderBlock, TurtleSoupSignal};

/// Structure events per timeframe that vote on the bias.
const BIAS_EVENTS: usize = 3;
/// Most recent liquidity zones carried into the feature bag.
const RECENT_ZONES: usize = 3;
/// Most recent structure events inspected for a BOS.
const RECENT_EVENTS: usize = 3;

const TRENDING_CONFIDENCE: f64 = 0.6;
const RANGING_CONFIDENCE: f64 = 0.5;
const LONG_TREND_BONUS: f64 = 0.1;

/// Confluence features read from the execution timeframe.
///
/// `risk` and `score` are filled in by the pipeline after routing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureBag {
    pub bias: Option<Side>,
    pub atr: Option<f64>,
    pub order_block: Option<OrderBlock>,
    pub liquidity: Vec<LiquidityZone>,
    pub bos: bool,
    pub fvg: Option<FairValueGap>,
    pub turtle: Option<TurtleSoupSignal>,
    pub divergence: bool,
    pub risk: Option<RiskResult>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct EnsembleDecision {
    pub context: SignalContext,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct EnsembleRouter {
    execution_timeframe: String,
}

impl EnsembleRouter {
    pub fn new(execution_timeframe: impl Into<String>) -> Self {
        Self {
            execution_timeframe: execution_timeframe.into(),
        }
    }

    pub fn execution_timeframe(&self) -> &str {
        &self.execution_timeframe
    }

    /// Build the signal context from the execution timeframe's analysis.
    ///
    /// Fails when the execution timeframe was not analysed.
    pub fn build_context(&self, symbol: &str, ctx: &MultiTimeframeContext) -> Result<EnsembleDecision, DataError> {
        let exec = ctx
            .get(&self.execution_timeframe)
            .ok_or_else(|| DataError::MissingTimeframe(self.execution_timeframe.clone()))?;
        let bias = self.derive_bias(ctx);

        let features = FeatureBag {
            bias,
            atr: exec.latest_atr(),
            order_block: exec.order_blocks.last().cloned(),
            liquidity: tail(&exec.liquidity, RECENT_ZONES).to_vec(),
            bos: tail(&exec.structure_events, RECENT_EVENTS).iter().any(|e| e.is_bos()),
            fvg: exec.fair_value_gaps.last().cloned(),
            turtle: exec.turtle_soup.last().cloned(),
            divergence: exec.indicators.momentum.divergence_on_last_bar(),
            risk: None,
            score: None,
        };

        let label = ctx.regime.label;
        let mut confidence = match label {
            RegimeLabel::Trending => TRENDING_CONFIDENCE,
            RegimeLabel::Ranging => RANGING_CONFIDENCE,
        };
        // Only long trades in a trending regime get the extra confidence.
        if bias == Some(Side::Long) && label == RegimeLabel::Trending {
            confidence += LONG_TREND_BONUS;
        }
        debug!(symbol, ?bias, confidence, bos = features.bos, "context routed");

        Ok(EnsembleDecision {
            context: SignalContext {
                symbol: symbol.to_string(),
                timeframe: self.execution_timeframe.clone(),
                candles: exec.candles.clone(),
                features,
                regime: RegimeSummary {
                    label,
                    volatility_percentile: ctx.regime.volatility_percentile,
                },
            },
            confidence,
        })
    }

    /// Vote across the higher timeframes.
    ///
    /// Each non-execution timeframe votes with the directions of its last
    /// three structure events, or with its first-vs-last close when it has
    /// none. A tie goes to the execution timeframe's own drift. Returns
    /// `None` only when the execution timeframe has no candles.
    pub fn derive_bias(&self, ctx: &MultiTimeframeContext) -> Option<Side> {
        let mut bullish = 0usize;
        let mut bearish = 0usize;
        for analysis in ctx.analyses.iter().filter(|a| a.timeframe != self.execution_timeframe) {
            let events = tail(&analysis.structure_events, BIAS_EVENTS);
            if events.is_empty() {
                match drift(analysis) {
                    Some(d) if d > 0.0 => bullish += 1,
                    Some(d) if d < 0.0 => bearish += 1,
                    _ => {}
                }
                continue;
            }
            for event in events {
                match event.direction {
                    Direction::Bullish => bullish += 1,
                    Direction::Bearish => bearish += 1,
                }
            }
        }

        match bullish.cmp(&bearish) {
            std::cmp::Ordering::Greater => Some(Side::Long),
            std::cmp::Ordering::Less => Some(Side::Short),
            std::cmp::Ordering::Equal => {
                let d = drift(ctx.get(&self.execution_timeframe)?)?;
                Some(if d >= 0.0 { Side::Long } else { Side::Short })
            }
        }
    }
}

fn drift(analysis: &TimeframeAnalysis) -> Option<f64> {
    Some(analysis.last_close()? - analysis.first_close()?)
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

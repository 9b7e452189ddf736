//! Signal assembly: gates the routed context and emits at most one signal.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::{Candle, Direction, OverlayPrimitive, RegimeLabel, SignalId, SignalReason, TradingSignal};
use crate::error::ConfigurationError;
use crate::pipeline::FeatureBag;
use crate::risk::{build_trade_levels, liquidity_filter, volatility_filter, FilterResults, VOLATILITY_CEILING};

/// The slice of the top-timeframe regime the builder needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeSummary {
    pub label: RegimeLabel,
    pub volatility_percentile: f64,
}

/// Everything the builder consumes for one symbol.
#[derive(Debug, Clone)]
pub struct SignalContext {
    pub symbol: String,
    pub timeframe: String,
    pub candles: Vec<Candle>,
    pub features: FeatureBag,
    pub regime: RegimeSummary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalBuilder {
    pub min_score: f64,
    pub min_rr: f64,
    pub min_volume: f64,
}

impl Default for SignalBuilder {
    fn default() -> Self {
        Self {
            min_score: 0.5,
            min_rr: 1.5,
            min_volume: 1_000_000.0,
        }
    }
}

impl SignalBuilder {
    pub fn new(min_score: f64, min_rr: f64, min_volume: f64) -> Self {
        Self {
            min_score,
            min_rr,
            min_volume,
        }
    }

    /// Emit zero or one signal.
    ///
    /// Gates short-circuit in order: bias present, RR >= `min_rr`, volatility
    /// and liquidity filters, score >= `min_score`. A failed gate yields an
    /// empty list. Errors only come from invalid derived trade levels.
    pub fn build(&self, context: &SignalContext) -> Result<Vec<TradingSignal>, ConfigurationError> {
        let features = &context.features;
        let Some(side) = features.bias else {
            debug!(symbol = %context.symbol, "no bias");
            return Ok(Vec::new());
        };
        let Some(last) = context.candles.last() else {
            return Ok(Vec::new());
        };

        let risk = match &features.risk {
            Some(risk) => risk.clone(),
            None => build_trade_levels(side, &context.candles, features.atr)?,
        };
        if risk.rr < self.min_rr {
            debug!(symbol = %context.symbol, rr = risk.rr, min_rr = self.min_rr, "rr gate");
            return Ok(Vec::new());
        }

        let filters = FilterResults {
            volatility: volatility_filter(context.regime.volatility_percentile, VOLATILITY_CEILING),
            liquidity: liquidity_filter(&context.candles, self.min_volume),
        };
        if !filters.passed() {
            debug!(symbol = %context.symbol, ?filters, "market filters");
            return Ok(Vec::new());
        }

        let mut reasons = vec![
            SignalReason::new("Bias", format!("{side} via multi-timeframe confluence")),
            SignalReason::new("Regime", format!("{} regime", context.regime.label)),
            SignalReason::new("RR", format!("{:.2} expected", risk.rr)),
        ];
        let mut overlays = Vec::new();

        if let Some(block) = &features.order_block {
            overlays.push(OverlayPrimitive {
                kind: "order_block".into(),
                payload: json!({
                    "timestamp": block.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                    "direction": block.direction.as_str(),
                    "high": block.high,
                    "low": block.low,
                }),
            });
            let name = match block.direction {
                Direction::Bullish => "Bullish",
                Direction::Bearish => "Bearish",
            };
            reasons.push(SignalReason::new("OrderBlock", format!("{name} OB respected")));
        }

        if !features.liquidity.is_empty() {
            overlays.extend(features.liquidity.iter().map(|zone| OverlayPrimitive {
                kind: "liquidity".into(),
                payload: json!({
                    "kind": zone.kind.to_string(),
                    "level": zone.level,
                    "start": zone.start.to_rfc3339_opts(SecondsFormat::Secs, true),
                }),
            }));
            reasons.push(SignalReason::new("Liquidity", format!("{} zones", features.liquidity.len())));
        }

        let score = features.score.unwrap_or(0.0);
        if score < self.min_score {
            debug!(symbol = %context.symbol, score, min_score = self.min_score, "score gate");
            return Ok(Vec::new());
        }

        Ok(vec![TradingSignal {
            id: SignalId::derive(&context.symbol, &context.timeframe, last.timestamp, side),
            symbol: context.symbol.clone(),
            timeframe: context.timeframe.clone(),
            direction: side,
            entry: risk.entry,
            stop_loss: risk.stop_loss,
            take_profits: risk.targets,
            rr: risk.rr,
            score,
            reasons,
            overlays,
            created_at: last.timestamp,
        }])
    }
}

//! End-to-end analysis for one symbol.

use tracing::debug;

use super::engine::MultiTimeframeEngine;
use super::router::EnsembleRouter;
use super::scoring::{calibrate_score, ScoreInputs};
use crate::config::AnalysisConfig;
use crate::domain::{CandlesByTimeframe, TradingSignal};
use crate::error::{AnalysisError, ConfigurationError};
use crate::risk::build_trade_levels;
use crate::signals::{deduplicate, enforce_quality, SignalBuilder};

/// engine → router → trade levels → score → builder → post-filter.
#[derive(Debug, Clone)]
pub struct AnalyzeAssetPipeline {
    config: AnalysisConfig,
    engine: MultiTimeframeEngine,
    router: EnsembleRouter,
    builder: SignalBuilder,
}

impl AnalyzeAssetPipeline {
    /// Validates the configuration up front.
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            engine: MultiTimeframeEngine::new(config.clone()),
            router: EnsembleRouter::new(config.execution_timeframe.clone()),
            builder: SignalBuilder::new(config.min_score, config.min_rr, config.min_volume),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Signals for `symbol`. An empty list means no gate passed.
    pub fn run(&self, symbol: &str, candles: &CandlesByTimeframe) -> Result<Vec<TradingSignal>, AnalysisError> {
        let ctx = self.engine.analyze(symbol, candles)?;
        let mut decision = self.router.build_context(symbol, &ctx)?;

        let features = &mut decision.context.features;
        let Some(side) = features.bias else {
            return Ok(Vec::new());
        };
        let risk = build_trade_levels(side, &decision.context.candles, features.atr)?;
        let inputs = ScoreInputs::from_features(features, risk.rr, ctx.regime.volatility_percentile);
        let breakdown = calibrate_score(&inputs, ctx.regime.label);
        features.score = Some(breakdown.total());
        features.risk = Some(risk);
        debug!(
            symbol,
            score = breakdown.total(),
            base = breakdown.base,
            bonus = breakdown.confluence_bonus,
            penalty = breakdown.penalty,
            "scored"
        );

        let signals = self.builder.build(&decision.context)?;
        let signals = deduplicate(signals, self.config.cooldown_minutes);
        Ok(enforce_quality(signals, self.config.min_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::indicators::make_candles;

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            timeframes: vec!["1h".into(), "15m".into()],
            execution_timeframe: "15m".into(),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn execution_timeframe_must_be_listed() {
        let bad = AnalysisConfig {
            execution_timeframe: "5m".into(),
            ..config()
        };
        assert_eq!(
            AnalyzeAssetPipeline::new(bad).unwrap_err(),
            ConfigurationError::ExecutionTimeframeMissing("5m".into())
        );
    }

    #[test]
    fn missing_series_is_a_data_error() {
        let pipeline = AnalyzeAssetPipeline::new(config()).unwrap();
        let candles: CandlesByTimeframe = [("1h".to_string(), make_candles(&[1.0, 2.0]))].into_iter().collect();
        assert_eq!(
            pipeline.run("BTC", &candles).unwrap_err(),
            AnalysisError::Data(DataError::MissingTimeframe("15m".into()))
        );
    }

    #[test]
    fn thin_volume_yields_no_signal() {
        let pipeline = AnalyzeAssetPipeline::new(config()).unwrap();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let candles: CandlesByTimeframe = [
            ("1h".to_string(), make_candles(&closes)),
            ("15m".to_string(), make_candles(&closes)),
        ]
        .into_iter()
        .collect();
        // make_candles volume is 1000, far below the default floor.
        assert!(pipeline.run("BTC", &candles).unwrap().is_empty());
    }
}

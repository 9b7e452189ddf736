//! StructLab Core: market-structure analysis and signal generation.
//!
//! This crate contains:
//! - Domain types (candles, labels, signal ids, trading signals)
//! - Indicator suite (moving averages, ATR, volatility, momentum, patterns, Fibonacci)
//! - Structure detectors (swings, BOS/CHOCH, FVG, order/breaker blocks, liquidity,
//!   turtle soup, microstructure, session VWAP, regime)
//! - Multi-timeframe engine, ensemble router and scoring calibrator
//! - Risk/reward engine and market filters
//! - Signal builder and post-filter
//!
//! Every detector is a pure function of its candle window; nothing is cached
//! between invocations.

pub mod config;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod pipeline;
pub mod risk;
pub mod signals;
pub mod stats;
pub mod structure;

pub use config::{AnalysisConfig, SwingConfig};
pub use error::{AnalysisError, ConfigurationError, DataError};
pub use pipeline::AnalyzeAssetPipeline;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the backtester shares across rayon
    /// workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::TradingSignal>();
        require_sync::<domain::TradingSignal>();
        require_send::<domain::SignalId>();
        require_sync::<domain::SignalId>();

        // Structure records
        require_send::<structure::SwingPoint>();
        require_sync::<structure::SwingPoint>();
        require_send::<structure::StructureEvent>();
        require_sync::<structure::StructureEvent>();
        require_send::<structure::LiquidityZone>();
        require_sync::<structure::LiquidityZone>();
        require_send::<structure::OrderBlock>();
        require_sync::<structure::OrderBlock>();
        require_send::<structure::RegimeState>();
        require_sync::<structure::RegimeState>();

        // Pipeline
        require_send::<AnalyzeAssetPipeline>();
        require_sync::<AnalyzeAssetPipeline>();
        require_send::<pipeline::MultiTimeframeContext>();
        require_sync::<pipeline::MultiTimeframeContext>();
        require_send::<pipeline::FeatureBag>();
        require_sync::<pipeline::FeatureBag>();
        require_send::<signals::SignalContext>();
        require_sync::<signals::SignalContext>();

        // Errors
        require_send::<AnalysisError>();
        require_sync::<AnalysisError>();
    }

    /// Indicators are shared as trait objects; the trait requires Send + Sync.
    #[test]
    fn indicator_trait_objects_build() {
        let boxed: Vec<Box<dyn indicators::Indicator>> = vec![
            Box::new(indicators::Atr::new(14)),
            Box::new(indicators::Rsi::new(14)),
            Box::new(indicators::MovingAverage::new(indicators::MaKind::Ema, 20)),
        ];
        let names: Vec<&str> = boxed.iter().map(|i| i.name()).collect();
        assert_eq!(names, ["atr_14", "rsi_14", "ema_20"]);
    }
}

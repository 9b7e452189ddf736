//! Multi-timeframe analysis: one full detector pass per configured timeframe.

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::domain::{Candle, CandlesByTimeframe, SwingKind, Timeframe};
use crate::error::DataError;
use crate::indicators::{
    align_with_swings, compute_candle_patterns, compute_momentum_suite, compute_moving_averages,
    compute_volatility_suite, CandlePatterns, FibonacciLevels, MomentumSuite, MovingAverageSuite,
    VolatilitySuite,
};
use crate::stats::last_finite;
use crate::structure::{
    classify_breakers, compute_microstructure, compute_session_vwap, compute_swings, detect_liquidity,
    detect_regime, detect_structure, detect_turtle_soup, find_fvg, find_order_blocks, latest_swing,
    BreakerBlock, FairValueGap, LiquidityZone, MicrostructureSnapshot, OrderBlock, RegimeState,
    SessionVwap, StructureEvent, SwingPoint, TurtleSoupSignal,
};

/// Periods of the per-timeframe moving-average suite.
pub const MA_PERIODS: [usize; 3] = [20, 50, 100];

#[derive(Debug, Clone, Default)]
pub struct IndicatorBundle {
    pub moving_averages: MovingAverageSuite,
    pub momentum: MomentumSuite,
    pub patterns: CandlePatterns,
    pub volatility: VolatilitySuite,
}

/// Everything the detectors found on one timeframe. Rebuilt on every call.
#[derive(Debug, Clone)]
pub struct TimeframeAnalysis {
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
    pub swings: Vec<SwingPoint>,
    pub structure_events: Vec<StructureEvent>,
    pub liquidity: Vec<LiquidityZone>,
    pub fair_value_gaps: Vec<FairValueGap>,
    pub order_blocks: Vec<OrderBlock>,
    pub breaker_blocks: Vec<BreakerBlock>,
    pub turtle_soup: Vec<TurtleSoupSignal>,
    pub indicators: IndicatorBundle,
    /// Anchored on the latest swing high and low, when they form a valid range.
    pub fibonacci: Option<FibonacciLevels>,
    pub session_vwap: SessionVwap,
    pub microstructure: MicrostructureSnapshot,
}

impl TimeframeAnalysis {
    pub fn latest_atr(&self) -> Option<f64> {
        last_finite(&self.indicators.volatility.atr)
    }

    pub fn first_close(&self) -> Option<f64> {
        self.candles.first().map(|c| c.close)
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }
}

/// Per-timeframe analyses in configured order plus the top-timeframe regime.
#[derive(Debug, Clone)]
pub struct MultiTimeframeContext {
    pub analyses: Vec<TimeframeAnalysis>,
    pub regime: RegimeState,
}

impl MultiTimeframeContext {
    pub fn get(&self, timeframe: &str) -> Option<&TimeframeAnalysis> {
        self.analyses.iter().find(|a| a.timeframe == timeframe)
    }
}

/// Run every detector over one candle window.
pub fn analyze_timeframe(timeframe: &str, candles: &[Candle], config: &AnalysisConfig) -> TimeframeAnalysis {
    let swings = compute_swings(candles, config.swing.atr_period, config.swing.atr_multiplier);
    let structure_events = detect_structure(&swings, config.structure_tolerance);
    let order_blocks = find_order_blocks(candles, &structure_events, config.order_block_lookback);
    let breaker_blocks = classify_breakers(&order_blocks, candles);

    let fibonacci = match (
        latest_swing(&swings, SwingKind::High),
        latest_swing(&swings, SwingKind::Low),
    ) {
        (Some(high), Some(low)) => align_with_swings(candles, high, low).ok(),
        _ => None,
    };

    let indicators = IndicatorBundle {
        moving_averages: compute_moving_averages(&crate::domain::closes(candles), &MA_PERIODS)
            .unwrap_or_default(),
        momentum: compute_momentum_suite(candles, config.divergence_lookback),
        patterns: compute_candle_patterns(candles),
        volatility: compute_volatility_suite(candles, config.swing.atr_period),
    };

    let analysis = TimeframeAnalysis {
        timeframe: timeframe.to_string(),
        candles: candles.to_vec(),
        liquidity: detect_liquidity(candles, config.liquidity_lookback, config.liquidity_tolerance),
        fair_value_gaps: find_fvg(candles, config.fvg_min_size),
        turtle_soup: detect_turtle_soup(candles, config.turtle_lookback),
        session_vwap: compute_session_vwap(candles),
        microstructure: compute_microstructure(candles),
        swings,
        structure_events,
        order_blocks,
        breaker_blocks,
        indicators,
        fibonacci,
    };
    debug!(
        timeframe,
        bars = candles.len(),
        swings = analysis.swings.len(),
        events = analysis.structure_events.len(),
        order_blocks = analysis.order_blocks.len(),
        zones = analysis.liquidity.len(),
        "timeframe analysed"
    );
    analysis
}

/// Builds a `MultiTimeframeContext` for the configured timeframes.
#[derive(Debug, Clone)]
pub struct MultiTimeframeEngine {
    config: AnalysisConfig,
}

impl MultiTimeframeEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyse every configured timeframe. The regime comes from the first one.
    pub fn analyze(&self, symbol: &str, candles: &CandlesByTimeframe) -> Result<MultiTimeframeContext, DataError> {
        let mut analyses = Vec::with_capacity(self.config.timeframes.len());
        let mut regime = None;
        for timeframe in &self.config.timeframes {
            let series = candles
                .get(timeframe)
                .ok_or_else(|| DataError::MissingTimeframe(timeframe.clone()))?;
            if series.is_empty() {
                return Err(DataError::EmptySeries(timeframe.clone()));
            }
            if regime.is_none() {
                regime = Some(detect_regime(series));
            }
            analyses.push(analyze_timeframe(timeframe, series, &self.config));
        }
        let regime = regime.ok_or_else(|| DataError::MissingTimeframe(String::new()))?;
        debug!(symbol, regime = %regime.label, hurst = regime.hurst, "multi-timeframe context built");
        Ok(MultiTimeframeContext { analyses, regime })
    }
}

//! Analysis configuration.
//!
//! Every tunable of the pipeline lives here. All fields have defaults so a
//! partial TOML section deserializes cleanly.

use serde::{Deserialize, Serialize};

use crate::domain::Timeframe;
use crate::error::ConfigurationError;

/// Parameters for one `AnalyzeAssetPipeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ordered from highest to lowest; the first entry drives the regime.
    pub timeframes: Vec<Timeframe>,
    /// Timeframe whose candles produce entries. Must be in `timeframes`.
    pub execution_timeframe: Timeframe,
    pub min_score: f64,
    pub min_rr: f64,
    /// Minimum rolling mean volume on the execution timeframe.
    pub min_volume: f64,
    pub swing: SwingConfig,
    /// Minimum spacing between kept signals of the same symbol and direction.
    pub cooldown_minutes: i64,
    /// Relative tolerance for BOS/CHOCH comparisons (fraction of price).
    pub structure_tolerance: f64,
    /// Minimum fair value gap size (fraction of price).
    pub fvg_min_size: f64,
    /// Relative tolerance for equal highs/lows clustering.
    pub liquidity_tolerance: f64,
    pub liquidity_lookback: usize,
    pub order_block_lookback: usize,
    pub turtle_lookback: usize,
    pub divergence_lookback: usize,
}

/// Swing detector parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingConfig {
    pub atr_period: usize,
    pub atr_multiplier: f64,
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            atr_multiplier: 1.5,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeframes: vec!["4h".into(), "1h".into(), "15m".into()],
            execution_timeframe: "15m".into(),
            min_score: 0.55,
            min_rr: 1.6,
            min_volume: 1_000_000.0,
            swing: SwingConfig::default(),
            cooldown_minutes: 5,
            structure_tolerance: 1e-6,
            fvg_min_size: 0.0005,
            liquidity_tolerance: 0.0005,
            liquidity_lookback: 20,
            order_block_lookback: 20,
            turtle_lookback: 20,
            divergence_lookback: 30,
        }
    }
}

impl AnalysisConfig {
    /// Check the configuration before any analysis runs.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.timeframes.is_empty() {
            return Err(ConfigurationError::EmptyTimeframes);
        }
        if !self.timeframes.contains(&self.execution_timeframe) {
            return Err(ConfigurationError::ExecutionTimeframeMissing(
                self.execution_timeframe.clone(),
            ));
        }
        if self.swing.atr_period == 0 {
            return Err(invalid("swing.atr_period", "must be >= 1"));
        }
        if self.swing.atr_multiplier.is_nan() || self.swing.atr_multiplier <= 0.0 {
            return Err(invalid("swing.atr_multiplier", "must be > 0"));
        }
        if self.cooldown_minutes < 0 {
            return Err(invalid("cooldown_minutes", "must be >= 0"));
        }
        for (name, value) in [
            ("structure_tolerance", self.structure_tolerance),
            ("fvg_min_size", self.fvg_min_size),
            ("liquidity_tolerance", self.liquidity_tolerance),
            ("min_volume", self.min_volume),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(invalid(name, "must be a non-negative number"));
            }
        }
        if self.liquidity_lookback < 2 {
            return Err(invalid("liquidity_lookback", "must be >= 2"));
        }
        if self.turtle_lookback == 0 {
            return Err(invalid("turtle_lookback", "must be >= 1"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidParameter {
        name,
        reason: reason.to_string(),
    }
}

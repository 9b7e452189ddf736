//! Fibonacci retracement/extension levels between a swing high and low.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;
use crate::error::ConfigurationError;
use crate::structure::SwingPoint;

pub const FIB_RATIOS: [f64; 7] = [0.236, 0.382, 0.5, 0.618, 0.786, 1.272, 1.618];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub anchor_high: f64,
    pub anchor_low: f64,
    /// Ascending by ratio; price = low + (high - low) × ratio.
    pub levels: Vec<FibLevel>,
}

impl FibonacciLevels {
    pub fn level(&self, ratio: f64) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| (l.ratio - ratio).abs() < 1e-9)
            .map(|l| l.price)
    }
}

pub fn project_levels(high: f64, low: f64) -> Result<FibonacciLevels, ConfigurationError> {
    if high.is_nan() || low.is_nan() || high <= low {
        return Err(ConfigurationError::InvalidAnchor { high, low });
    }
    let diff = high - low;
    Ok(FibonacciLevels {
        anchor_high: high,
        anchor_low: low,
        levels: FIB_RATIOS
            .iter()
            .map(|&ratio| FibLevel {
                ratio,
                price: low + diff * ratio,
            })
            .collect(),
    })
}

/// Levels anchored on the high of the swing-high bar and the low of the swing-low bar.
pub fn align_with_swings(
    candles: &[Candle],
    swing_high: &SwingPoint,
    swing_low: &SwingPoint,
) -> Result<FibonacciLevels, ConfigurationError> {
    let high = candles.get(swing_high.index).map_or(swing_high.price, |c| c.high);
    let low = candles.get(swing_low.index).map_or(swing_low.price, |c| c.low);
    project_levels(high, low)
}

//! Market-condition filters applied before a signal is emitted.

use serde::{Deserialize, Serialize};

use crate::domain::{volumes, Candle};
use crate::stats::rolling_mean;

/// Maximum volatility percentile at which signals are still taken.
pub const VOLATILITY_CEILING: f64 = 95.0;

const VOLUME_WINDOW: usize = 10;

pub fn volatility_filter(volatility_percentile: f64, threshold: f64) -> bool {
    volatility_percentile <= threshold
}

/// Rolling 10-bar mean volume (or the last bar's volume during warm-up) >= `min_volume`.
pub fn liquidity_filter(candles: &[Candle], min_volume: f64) -> bool {
    let mean = rolling_mean(&volumes(candles), VOLUME_WINDOW);
    let recent = match mean.last() {
        Some(v) if !v.is_nan() => *v,
        _ => match candles.last() {
            Some(c) => c.volume,
            None => return false,
        },
    };
    recent >= min_volume
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResults {
    pub volatility: bool,
    pub liquidity: bool,
}

impl FilterResults {
    pub fn passed(&self) -> bool {
        self.volatility && self.liquidity
    }
}

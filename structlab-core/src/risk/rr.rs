//! Risk-to-reward engine.
//!
//! Long: entry at the recent high, targets at +1, +1.5 and +2 ATR, stop at the
//! lower of the recent low and entry - 0.5 ATR. Short mirrors this.
//! RR is the mean of the per-target reward/risk ratios.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Side};
use crate::error::ConfigurationError;

/// Bars defining the recent high/low.
pub const RECENT_BARS: usize = 5;

const TARGET_ATR_MULTIPLES: [f64; 3] = [1.0, 1.5, 2.0];
const STOP_ATR_BUFFER: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub entry: f64,
    pub stop_loss: f64,
    pub targets: Vec<f64>,
    pub rr: f64,
}

fn non_positive(price: f64) -> bool {
    price.is_nan() || price <= 0.0
}

/// Mean reward/risk across `targets`.
///
/// A zero risk distance contributes an RR of 0.
pub fn compute_rr(
    side: Side,
    entry: f64,
    stop_loss: f64,
    targets: Vec<f64>,
) -> Result<RiskResult, ConfigurationError> {
    if non_positive(entry) || non_positive(stop_loss) {
        return Err(ConfigurationError::NonPositivePrice {
            entry,
            stop: stop_loss,
        });
    }
    if targets.is_empty() {
        return Err(ConfigurationError::EmptyTargets);
    }

    let ratios: Vec<f64> = targets
        .iter()
        .map(|&target| {
            let (reward, risk) = match side {
                Side::Long => (target - entry, entry - stop_loss),
                Side::Short => (entry - target, stop_loss - entry),
            };
            if risk == 0.0 {
                0.0
            } else {
                reward / risk
            }
        })
        .collect();
    let rr = ratios.iter().sum::<f64>() / ratios.len() as f64;

    Ok(RiskResult {
        entry,
        stop_loss,
        targets,
        rr,
    })
}

/// Derive entry, stop and targets from the last `RECENT_BARS` candles.
///
/// `atr` is the execution timeframe's latest ATR; when absent or not finite
/// half the recent range is used instead.
pub fn build_trade_levels(side: Side, candles: &[Candle], atr: Option<f64>) -> Result<RiskResult, ConfigurationError> {
    let recent = &candles[candles.len().saturating_sub(RECENT_BARS)..];
    let recent_low = recent.iter().map(|c| c.low).fold(f64::NAN, f64::min);
    let recent_high = recent.iter().map(|c| c.high).fold(f64::NAN, f64::max);
    let atr = atr
        .filter(|v| v.is_finite())
        .unwrap_or((recent_high - recent_low) / 2.0);

    let (entry, stop, targets) = match side {
        Side::Long => {
            let entry = recent_high;
            let targets: Vec<f64> = TARGET_ATR_MULTIPLES.iter().map(|m| entry + atr * m).collect();
            (entry, recent_low.min(entry - atr * STOP_ATR_BUFFER), targets)
        }
        Side::Short => {
            let entry = recent_low;
            let targets: Vec<f64> = TARGET_ATR_MULTIPLES.iter().map(|m| entry - atr * m).collect();
            (entry, recent_high.max(entry + atr * STOP_ATR_BUFFER), targets)
        }
    };
    compute_rr(side, entry, stop, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    #[test]
    fn long_rr_is_mean_of_targets() {
        let risk = compute_rr(Side::Long, 100.0, 95.0, vec![105.0, 110.0]).unwrap();
        assert_approx(risk.rr, 1.5, DEFAULT_EPSILON);
    }

    #[test]
    fn short_rr_mirrors_long() {
        let risk = compute_rr(Side::Short, 100.0, 104.0, vec![96.0, 92.0]).unwrap();
        assert_approx(risk.rr, 1.5, DEFAULT_EPSILON);
    }

    #[test]
    fn non_positive_prices_rejected() {
        assert!(matches!(
            compute_rr(Side::Long, 0.0, 95.0, vec![105.0]),
            Err(ConfigurationError::NonPositivePrice { .. })
        ));
        assert!(matches!(
            compute_rr(Side::Short, 100.0, -1.0, vec![90.0]),
            Err(ConfigurationError::NonPositivePrice { .. })
        ));
        assert_eq!(
            compute_rr(Side::Long, 100.0, 95.0, vec![]),
            Err(ConfigurationError::EmptyTargets)
        );
    }

    #[test]
    fn zero_risk_distance_gives_zero_rr() {
        let risk = compute_rr(Side::Long, 100.0, 100.0, vec![105.0]).unwrap();
        assert_eq!(risk.rr, 0.0);
    }

    #[test]
    fn long_levels_from_recent_range() {
        let candles = make_ohlc_candles(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 102.0, 100.0, 101.5),
            (101.5, 103.0, 101.0, 102.5),
            (102.5, 104.0, 102.0, 103.5),
            (103.5, 105.0, 103.0, 104.5),
        ]);
        let risk = build_trade_levels(Side::Long, &candles, Some(2.0)).unwrap();
        assert_eq!(risk.entry, 105.0);
        assert_eq!(risk.targets, vec![107.0, 108.0, 109.0]);
        // min(recent low 99, 105 - 1) = 99
        assert_eq!(risk.stop_loss, 99.0);
        assert_approx(risk.rr, (2.0 + 3.0 + 4.0) / 3.0 / 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn short_levels_fall_back_to_half_range() {
        let candles = make_ohlc_candles(&[(100.0, 104.0, 96.0, 98.0)]);
        let risk = build_trade_levels(Side::Short, &candles, Some(f64::NAN)).unwrap();
        // atr = (104 - 96) / 2 = 4
        assert_eq!(risk.entry, 96.0);
        assert_eq!(risk.stop_loss, 104.0);
        assert_eq!(risk.targets, vec![92.0, 90.0, 88.0]);
        assert_approx(risk.rr, 0.75, DEFAULT_EPSILON);
    }

    #[test]
    fn empty_window_is_rejected() {
        assert!(build_trade_levels(Side::Long, &[], None).is_err());
    }
}

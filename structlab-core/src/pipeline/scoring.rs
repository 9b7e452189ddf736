//! Confluence scoring.

use serde::{Deserialize, Serialize};

use super::router::FeatureBag;
use crate::domain::RegimeLabel;
use crate::risk::VOLATILITY_CEILING;

const BOS_BONUS: f64 = 0.15;
const FVG_BONUS: f64 = 0.10;
const TURTLE_BONUS: f64 = 0.10;
const DIVERGENCE_BONUS: f64 = 0.10;
const ORDER_BLOCK_BONUS: f64 = 0.15;
const LIQUIDITY_BONUS: f64 = 0.05;
const HIGH_RR_BONUS: f64 = 0.05;
const LOW_RR_PENALTY: f64 = 0.20;
const VOLATILITY_PENALTY: f64 = 0.20;

const LOW_RR: f64 = 1.5;
const HIGH_RR: f64 = 2.5;

/// Flattened confluence flags fed to `calibrate_score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub bos: bool,
    pub fvg: bool,
    pub turtle: bool,
    pub divergence: bool,
    pub order_block: bool,
    pub liquidity_zones: usize,
    pub rr: f64,
    pub volatility_percentile: f64,
}

impl ScoreInputs {
    pub fn from_features(features: &FeatureBag, rr: f64, volatility_percentile: f64) -> Self {
        Self {
            bos: features.bos,
            fvg: features.fvg.is_some(),
            turtle: features.turtle.is_some(),
            divergence: features.divergence,
            order_block: features.order_block.is_some(),
            liquidity_zones: features.liquidity.len(),
            rr,
            volatility_percentile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub confluence_bonus: f64,
    pub penalty: f64,
}

impl ScoreBreakdown {
    /// `base + confluence_bonus - penalty`, clamped to [0, 1].
    pub fn total(&self) -> f64 {
        (self.base + self.confluence_bonus - self.penalty).clamp(0.0, 1.0)
    }
}

pub fn calibrate_score(inputs: &ScoreInputs, regime: RegimeLabel) -> ScoreBreakdown {
    let base = match regime {
        RegimeLabel::Trending => 0.5,
        RegimeLabel::Ranging => 0.4,
    };

    let mut bonus = 0.0;
    let mut penalty = 0.0;
    for (hit, weight) in [
        (inputs.bos, BOS_BONUS),
        (inputs.fvg, FVG_BONUS),
        (inputs.turtle, TURTLE_BONUS),
        (inputs.divergence, DIVERGENCE_BONUS),
        (inputs.order_block, ORDER_BLOCK_BONUS),
        (inputs.liquidity_zones >= 2, LIQUIDITY_BONUS),
    ] {
        if hit {
            bonus += weight;
        }
    }

    if inputs.rr < LOW_RR {
        penalty += LOW_RR_PENALTY;
    } else if inputs.rr > HIGH_RR {
        bonus += HIGH_RR_BONUS;
    }
    if inputs.volatility_percentile > VOLATILITY_CEILING {
        penalty += VOLATILITY_PENALTY;
    }

    ScoreBreakdown {
        base,
        confluence_bonus: bonus,
        penalty,
    }
}

//! Market-structure detectors.
//!
//! Swings feed the BOS/CHOCH analyzer, whose events feed order blocks, which
//! in turn feed breaker classification. Every other detector is a stateless
//! pass over the candle window.

pub mod bos_choch;
pub mod breaker_blocks;
pub mod fvg;
pub mod liquidity;
pub mod microstructure;
pub mod order_blocks;
pub mod regime;
pub mod swings;
pub mod turtle_soup;
pub mod vwap;

pub use bos_choch::{detect_structure, StructureEvent};
pub use breaker_blocks::{classify_breakers, BreakerBlock};
pub use fvg::{find_fvg, FairValueGap};
pub use liquidity::{
    daily_levels, detect_equal_highs_lows, detect_liquidity, merge_zones, session_high_low,
    LiquidityKind, LiquidityZone,
};
pub use microstructure::{compute_microstructure, MicrostructureSnapshot};
pub use order_blocks::{find_order_blocks, OrderBlock};
pub use regime::{detect_regime, hurst_exponent, RegimeState};
pub use swings::{compute_swings, latest_swing, SwingPoint};
pub use turtle_soup::{detect_turtle_soup, TurtleSoupSignal};
pub use vwap::{compute_session_vwap, SessionVwap};

//! Domain types for StructLab

pub mod candle;
pub mod ids;
pub mod labels;
pub mod signal;

use std::collections::BTreeMap;

pub use candle::{closes, first_invalid_bar, highs, lows, volumes, Candle};
pub use ids::SignalId;
pub use labels::{Direction, RegimeLabel, Session, Side, StructureKind, SwingKind};
pub use signal::{OverlayPrimitive, SignalDto, SignalReason, TradingSignal};

/// Symbol type alias
pub type Symbol = String;

/// Timeframe label, e.g. "4h", "15m".
pub type Timeframe = String;

/// Candle series keyed by timeframe.
pub type CandlesByTimeframe = BTreeMap<Timeframe, Vec<Candle>>;

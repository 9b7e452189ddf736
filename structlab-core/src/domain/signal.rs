//! Trading signal: the pipeline's output record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::ids::SignalId;
use super::labels::Side;

/// One human-readable justification attached to a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalReason {
    pub label: String,
    pub detail: String,
}

impl SignalReason {
    pub fn new(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            detail: detail.into(),
        }
    }
}

/// A drawable annotation for a chart front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPrimitive {
    pub kind: String,
    pub payload: serde_json::Value,
}

/// An actionable trade idea. Immutable once built.
///
/// Every signal satisfied the RR and score gates at creation; entry and
/// stop are strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub id: SignalId,
    pub symbol: String,
    pub timeframe: String,
    pub direction: Side,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profits: Vec<f64>,
    pub rr: f64,
    pub score: f64,
    pub reasons: Vec<SignalReason>,
    pub overlays: Vec<OverlayPrimitive>,
    pub created_at: DateTime<Utc>,
}

/// Flat transfer shape: string enums and RFC 3339 timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDto {
    pub id: String,
    pub symbol: String,
    pub timeframe: String,
    pub direction: String,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profits: Vec<f64>,
    pub rr: f64,
    pub score: f64,
    pub reasons: Vec<SignalReason>,
    pub overlays: Vec<OverlayPrimitive>,
    pub created_at: String,
}

impl TradingSignal {
    pub fn to_dto(&self) -> SignalDto {
        SignalDto {
            id: self.id.to_string(),
            symbol: self.symbol.clone(),
            timeframe: self.timeframe.clone(),
            direction: self.direction.as_str().to_string(),
            entry: self.entry,
            stop_loss: self.stop_loss,
            take_profits: self.take_profits.clone(),
            rr: self.rr,
            score: self.score,
            reasons: self.reasons.clone(),
            overlays: self.overlays.clone(),
            created_at: self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::labels::Side;

/// Deterministic signal ID: BLAKE3 of symbol, timeframe, bar timestamp and side.
///
/// The same candle producing the same trade idea always hashes to the same ID,
/// so re-running an analysis never mints duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub String);

impl SignalId {
    pub fn derive(symbol: &str, timeframe: &str, timestamp: DateTime<Utc>, side: Side) -> Self {
        let key = format!(
            "{symbol}-{timeframe}-{}-{side}",
            timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        Self(blake3::hash(key.as_bytes()).to_hex().to_string())
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Session-anchored VWAP of typical price.

use crate::domain::{Candle, Session};

#[derive(Debug, Clone, Default)]
pub struct SessionVwap {
    /// Session label of each bar.
    pub sessions: Vec<Session>,
    /// Cumulative VWAP since the start of the bar's session segment.
    pub vwap: Vec<f64>,
}

impl SessionVwap {
    pub fn latest(&self) -> Option<(Session, f64)> {
        Some((*self.sessions.last()?, *self.vwap.last()?))
    }
}

/// The accumulation resets whenever consecutive bars fall in different
/// sessions. Zero or missing volume reuses the last positive volume of the
/// segment, or 1 when there is none yet.
pub fn compute_session_vwap(candles: &[Candle]) -> SessionVwap {
    let mut sessions = Vec::with_capacity(candles.len());
    let mut vwap = Vec::with_capacity(candles.len());

    let mut current: Option<Session> = None;
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;
    let mut last_volume: Option<f64> = None;

    for c in candles {
        let session = Session::of(c.timestamp);
        if current != Some(session) {
            current = Some(session);
            cum_pv = 0.0;
            cum_vol = 0.0;
            last_volume = None;
        }
        let volume = if c.volume > 0.0 {
            last_volume = Some(c.volume);
            c.volume
        } else {
            last_volume.unwrap_or(1.0)
        };
        cum_pv += c.typical_price() * volume;
        cum_vol += volume;
        sessions.push(session);
        vwap.push(cum_pv / cum_vol);
    }

    SessionVwap { sessions, vwap }
}

//! Closed label enums shared across detectors, pipeline and backtester.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a structural event or zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
        }
    }

    /// Trade side this direction argues for.
    pub fn side(self) -> Side {
        match self {
            Direction::Bullish => Side::Long,
            Direction::Bearish => Side::Short,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trade side / directional bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeLabel {
    Trending,
    Ranging,
}

impl RegimeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            RegimeLabel::Trending => "trending",
            RegimeLabel::Ranging => "ranging",
        }
    }
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Break of structure (trend continuation) or change of character (reversal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StructureKind {
    Bos,
    Choch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

impl SwingKind {
    pub fn flip(self) -> Self {
        match self {
            SwingKind::High => SwingKind::Low,
            SwingKind::Low => SwingKind::High,
        }
    }
}

/// Trading session, by UTC hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Asia,
    Europe,
    Us,
}

impl Session {
    /// Asia 23:00–07:00, Europe 07:00–13:00, US 13:00–23:00 (UTC).
    pub fn from_utc_hour(hour: u32) -> Self {
        if hour >= 23 || hour < 7 {
            Session::Asia
        } else if hour < 13 {
            Session::Europe
        } else {
            Session::Us
        }
    }

    pub fn of(timestamp: DateTime<Utc>) -> Self {
        Self::from_utc_hour(timestamp.hour())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Session::Asia => "asia",
            Session::Europe => "europe",
            Session::Us => "us",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

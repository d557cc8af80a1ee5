//! Directional vocabulary shared by the scorer, risk manager and backtest.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Call,
    Put,
    Wait,
}

impl Signal {
    /// Trade side for an actionable signal.
    pub fn side(self) -> Option<Side> {
        match self {
            Signal::Call => Some(Side::Long),
            Signal::Put => Some(Side::Short),
            Signal::Wait => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Call => write!(f, "CALL"),
            Signal::Put => write!(f, "PUT"),
            Signal::Wait => write!(f, "WAIT"),
        }
    }
}

/// Market trend from the fast/slow EMA comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "ALTA")]
    Bullish,
    #[serde(rename = "BAIXA")]
    Bearish,
    #[serde(rename = "LATERAL")]
    Lateral,
}

impl Trend {
    pub fn side(self) -> Option<Side> {
        match self {
            Trend::Bullish => Some(Side::Long),
            Trend::Bearish => Some(Side::Short),
            Trend::Lateral => None,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "ALTA"),
            Trend::Bearish => write!(f, "BAIXA"),
            Trend::Lateral => write!(f, "LATERAL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn signal(self) -> Signal {
        match self {
            Side::Long => Signal::Call,
            Side::Short => Signal::Put,
        }
    }
}

//! Candlestick pattern classification.
//!
//! Each flag looks at the current candle and at most the one before it.

use serde::{Deserialize, Serialize};

use crate::domain::candle::Candle;

const HAMMER_MAX_BODY: f64 = 0.3;
const HAMMER_MIN_WICK_TO_BODY: f64 = 2.0;
const DOJI_MAX_BODY: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFlags {
    pub hammer: bool,
    pub shooting_star: bool,
    pub bullish_engulfing: bool,
    pub bearish_engulfing: bool,
    pub doji: bool,
}

impl PatternFlags {
    pub fn bullish(&self) -> bool {
        self.hammer || self.bullish_engulfing
    }

    pub fn bearish(&self) -> bool {
        self.shooting_star || self.bearish_engulfing
    }

    /// Names of the patterns that fired, in a fixed order.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.hammer, "hammer"),
            (self.shooting_star, "shooting_star"),
            (self.bullish_engulfing, "bullish_engulfing"),
            (self.bearish_engulfing, "bearish_engulfing"),
            (self.doji, "doji"),
        ]
        .into_iter()
        .filter_map(|(fired, name)| fired.then_some(name))
        .collect()
    }
}

pub fn detect_patterns(candles: &[Candle]) -> Vec<PatternFlags> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| classify(c, i.checked_sub(1).map(|p| &candles[p])))
        .collect()
}

fn classify(c: &Candle, prev: Option<&Candle>) -> PatternFlags {
    let range = c.range();
    if range <= 0.0 {
        return PatternFlags::default();
    }
    let body = c.body();
    let small_body = body <= HAMMER_MAX_BODY * range;

    let hammer = c.is_bullish()
        && small_body
        && c.lower_wick() >= HAMMER_MIN_WICK_TO_BODY * body
        && c.upper_wick() <= body;
    let shooting_star = c.is_bearish()
        && small_body
        && c.upper_wick() >= HAMMER_MIN_WICK_TO_BODY * body
        && c.lower_wick() <= body;

    let (bullish_engulfing, bearish_engulfing) = match prev {
        Some(p) => (
            c.is_bullish() && p.is_bearish() && c.close > p.open && c.open < p.close,
            c.is_bearish() && p.is_bullish() && c.close < p.open && c.open > p.close,
        ),
        None => (false, false),
    };

    PatternFlags {
        hammer,
        shooting_star,
        bullish_engulfing,
        bearish_engulfing,
        doji: body <= DOJI_MAX_BODY * range,
    }
}

//! OHLCV candle representation and sequence validation.

use serde::{Deserialize, Serialize};

use super::error::TradeSetupError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Epoch seconds.
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Check every candle and the ordering of the sequence.
///
/// Prices must be finite and positive, volume finite and non-negative,
/// `low <= min(open, close) <= max(open, close) <= high`, and timestamps
/// strictly increasing.
pub fn validate_candles(candles: &[Candle]) -> Result<(), TradeSetupError> {
    let invalid = |index: usize, reason: String| TradeSetupError::InvalidCandle { index, reason };

    for (index, c) in candles.iter().enumerate() {
        for (name, price) in [("open", c.open), ("high", c.high), ("low", c.low), ("close", c.close)] {
            if !price.is_finite() || price <= 0.0 {
                return Err(invalid(index, format!("{name} must be a positive price, got {price}")));
            }
        }
        if !c.volume.is_finite() || c.volume < 0.0 {
            return Err(invalid(index, format!("volume must be non-negative, got {}", c.volume)));
        }
        if c.low > c.open.min(c.close) || c.open.max(c.close) > c.high {
            return Err(invalid(
                index,
                format!(
                    "OHLC out of order (o={}, h={}, l={}, c={})",
                    c.open, c.high, c.low, c.close
                ),
            ));
        }
        if index > 0 && c.timestamp <= candles[index - 1].timestamp {
            return Err(invalid(
                index,
                format!(
                    "timestamp {} does not follow {}",
                    c.timestamp,
                    candles[index - 1].timestamp
                ),
            ));
        }
    }
    Ok(())
}

//! Candle data access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::TradeSetupError;

pub trait CandlePort {
    /// Candles for `symbol`, ascending by timestamp.
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, TradeSetupError>;

    fn list_symbols(&self) -> Result<Vec<String>, TradeSetupError>;
}

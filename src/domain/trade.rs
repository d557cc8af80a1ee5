//! Simulated trade lifecycle.
//!
//! A trade is either `Open` with its initial stop, or `Trailing` once the
//! first target has been touched. `step` advances it by one bar and checks,
//! in this order: stop (or trailing stop), first target, second target.
//! When a bar's range spans both the stop and a target the stop wins.
//!
//! Touching TP1 never closes a trade; it only moves the stop to break-even
//! and starts trailing, so `CloseReason` has no TP1 variant.

use serde::{Deserialize, Serialize};

use super::candle::Candle;
use super::risk::RiskLevels;
use super::signal::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    #[serde(rename = "STOP")]
    Stop,
    #[serde(rename = "TP2")]
    TakeProfit2,
    #[serde(rename = "TRAIL")]
    Trail,
    #[serde(rename = "END")]
    EndOfData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeState {
    Open,
    Trailing { stop: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub open_index: usize,
    pub open_timestamp: i64,
    pub levels: RiskLevels,
    pub state: TradeState,
    /// Distance kept between the trailing stop and the best price.
    pub trail_distance: f64,
}

/// Where and why a trade left the market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exit {
    pub price: f64,
    pub reason: CloseReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Hold(Trade),
    Close(Trade, Exit),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub side: Side,
    pub open_index: usize,
    pub close_index: usize,
    pub open_timestamp: i64,
    pub close_timestamp: i64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub trailing_stop: Option<f64>,
    pub position_size: f64,
    pub risk_amount: f64,
    pub close_price: f64,
    pub close_reason: CloseReason,
    pub pnl: f64,
    pub capital_after: f64,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        match self.close_reason {
            CloseReason::Stop => false,
            CloseReason::TakeProfit2 | CloseReason::Trail => true,
            CloseReason::EndOfData => self.pnl > 0.0,
        }
    }
}

impl Trade {
    pub fn new(open_index: usize, open_timestamp: i64, levels: RiskLevels, trail_multiple: f64) -> Self {
        Self {
            open_index,
            open_timestamp,
            levels,
            state: TradeState::Open,
            trail_distance: trail_multiple * levels.risk_per_unit,
        }
    }

    pub fn side(&self) -> Side {
        self.levels.side
    }

    /// Stop currently in force.
    pub fn active_stop(&self) -> f64 {
        match self.state {
            TradeState::Open => self.levels.stop_loss,
            TradeState::Trailing { stop } => stop,
        }
    }

    pub fn pnl_at(&self, price: f64) -> f64 {
        self.side().sign() * (price - self.levels.entry_price) * self.levels.position_size
    }

    pub fn close(self, exit: Exit, close_index: usize, close_timestamp: i64, capital_before: f64) -> ClosedTrade {
        let pnl = self.pnl_at(exit.price);
        let trailing_stop = match self.state {
            TradeState::Open => None,
            TradeState::Trailing { stop } => Some(stop),
        };
        ClosedTrade {
            side: self.side(),
            open_index: self.open_index,
            close_index,
            open_timestamp: self.open_timestamp,
            close_timestamp,
            entry_price: self.levels.entry_price,
            stop_loss: self.levels.stop_loss,
            take_profit_1: self.levels.take_profit_1,
            take_profit_2: self.levels.take_profit_2,
            trailing_stop,
            position_size: self.levels.position_size,
            risk_amount: self.levels.risk_amount,
            close_price: exit.price,
            close_reason: exit.reason,
            pnl,
            capital_after: capital_before + pnl,
        }
    }
}

/// Advance `trade` through one bar.
pub fn step(mut trade: Trade, candle: &Candle) -> Step {
    let side = trade.side();
    let levels = trade.levels;
    // Adverse and favourable extremes of the bar for this side.
    let (adverse, favourable) = match side {
        Side::Long => (candle.low, candle.high),
        Side::Short => (candle.high, candle.low),
    };
    let reached = |price: f64, level: f64| side.sign() * (price - level) >= 0.0;

    let stop = trade.active_stop();
    if side.sign() * (adverse - stop) <= 0.0 {
        let reason = match trade.state {
            TradeState::Open => CloseReason::Stop,
            TradeState::Trailing { .. } => CloseReason::Trail,
        };
        return Step::Close(trade, Exit { price: stop, reason });
    }

    if trade.state == TradeState::Open && reached(favourable, levels.take_profit_1) {
        trade.state = TradeState::Trailing {
            stop: levels.entry_price,
        };
    }

    if reached(favourable, levels.take_profit_2) {
        return Step::Close(
            trade,
            Exit {
                price: levels.take_profit_2,
                reason: CloseReason::TakeProfit2,
            },
        );
    }

    if let TradeState::Trailing { stop } = trade.state {
        let candidate = favourable - side.sign() * trade.trail_distance;
        let ratcheted = match side {
            Side::Long => stop.max(candidate),
            Side::Short => stop.min(candidate),
        };
        trade.state = TradeState::Trailing { stop: ratcheted };
    }

    Step::Hold(trade)
}

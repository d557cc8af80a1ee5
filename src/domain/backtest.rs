//! Bar-by-bar strategy replay.
//!
//! Indicators are computed once for the whole sequence. From the warm-up
//! index onward each bar either advances the open trade or, when flat, asks
//! the `SignalSource` for an entry. At most one trade is open at a time and
//! a bar that closes a trade never opens the next one.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::candle::Candle;
use super::error::TradeSetupError;
use super::indicator::{IndicatorConfig, IndicatorSeries};
use super::metrics::BacktestResult;
use super::risk::RiskManager;
use super::scorer::SignalSource;
use super::trade::{step, ClosedTrade, CloseReason, Exit, Step, Trade};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub min_candles: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            min_candles: 100,
        }
    }
}

/// Entry gates applied on top of the signal source.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestLimits {
    pub min_candles: usize,
    pub risk_reward_min: f64,
    /// Percent of the day's opening capital.
    pub max_daily_loss_pct: f64,
    /// Percent below peak capital.
    pub max_drawdown_pct: f64,
}

/// Realised loss bookkeeping for one UTC day.
#[derive(Debug, Clone, Copy)]
struct DayBook {
    date: Option<NaiveDate>,
    opening_capital: f64,
    pnl: f64,
    blocked: bool,
}

impl DayBook {
    fn roll(&mut self, date: Option<NaiveDate>, capital: f64) {
        if date != self.date {
            *self = DayBook {
                date,
                opening_capital: capital,
                pnl: 0.0,
                blocked: false,
            };
        }
    }

    fn loss_pct(&self) -> f64 {
        if self.opening_capital > 0.0 && self.pnl < 0.0 {
            -self.pnl / self.opening_capital * 100.0
        } else {
            0.0
        }
    }
}

pub fn run_backtest<S: SignalSource + ?Sized>(
    candles: &[Candle],
    initial_capital: f64,
    source: &S,
    indicators: &IndicatorConfig,
    risk: &RiskManager,
    limits: &BacktestLimits,
) -> Result<BacktestResult, TradeSetupError> {
    if candles.len() < limits.min_candles {
        return Err(TradeSetupError::InsufficientData {
            have: candles.len(),
            need: limits.min_candles,
        });
    }
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(TradeSetupError::invalid_config(
            "backtest",
            "initial_capital",
            format!("must be positive, got {initial_capital}"),
        ));
    }

    let series = IndicatorSeries::compute(candles, indicators)?;
    let trail_multiple = risk.config().trail_multiple;

    let mut capital = initial_capital;
    let mut peak = initial_capital;
    let mut halted = false;
    let mut day = DayBook {
        date: None,
        opening_capital: capital,
        pnl: 0.0,
        blocked: false,
    };
    let mut open: Option<Trade> = None;
    let mut closed: Vec<ClosedTrade> = Vec::new();

    for (index, candle) in candles.iter().enumerate().skip(series.warm_up) {
        day.roll(utc_date(candle.timestamp), capital);

        if let Some(trade) = open.take() {
            match step(trade, candle) {
                Step::Hold(trade) => open = Some(trade),
                Step::Close(trade, exit) => {
                    let ct = trade.close(exit, index, candle.timestamp, capital);
                    tracing::debug!(
                        index,
                        reason = ?ct.close_reason,
                        price = ct.close_price,
                        pnl = ct.pnl,
                        "trade closed"
                    );
                    capital = ct.capital_after;
                    day.pnl += ct.pnl;
                    peak = peak.max(capital);
                    closed.push(ct);

                    if !day.blocked && day.loss_pct() >= limits.max_daily_loss_pct {
                        day.blocked = true;
                        tracing::warn!(
                            index,
                            loss_pct = day.loss_pct(),
                            "daily loss limit reached; entries blocked for the rest of the day"
                        );
                    }
                    let drawdown_pct = (peak - capital) / peak * 100.0;
                    if !halted && drawdown_pct >= limits.max_drawdown_pct {
                        halted = true;
                        tracing::warn!(
                            index,
                            drawdown_pct,
                            "drawdown limit reached; no further entries"
                        );
                    }
                }
            }
            continue;
        }

        if halted || day.blocked {
            continue;
        }

        let Some(side) = source.signal_at(candles, &series, index).side() else {
            continue;
        };
        let Some(atr) = series.atr[index] else {
            continue;
        };
        let levels = match risk.levels(side, candle.close, atr, capital) {
            Ok(levels) => levels,
            Err(e) => {
                tracing::debug!(index, error = %e, "entry skipped");
                continue;
            }
        };
        if !levels.meets(limits.risk_reward_min) {
            tracing::debug!(
                index,
                risk_reward = levels.risk_reward_1,
                "entry skipped: risk:reward below minimum"
            );
            continue;
        }

        tracing::debug!(
            index,
            side = ?side,
            entry = levels.entry_price,
            stop = levels.stop_loss,
            size = levels.position_size,
            "trade opened"
        );
        open = Some(Trade::new(index, candle.timestamp, levels, trail_multiple));
    }

    if let (Some(trade), Some(last)) = (open, candles.last()) {
        let exit = Exit {
            price: last.close,
            reason: CloseReason::EndOfData,
        };
        let ct = trade.close(exit, candles.len() - 1, last.timestamp, capital);
        tracing::debug!(pnl = ct.pnl, "open trade closed at end of data");
        closed.push(ct);
    }

    let result = BacktestResult::compute(initial_capital, closed, halted);
    tracing::info!(
        trades = result.total_trades,
        wins = result.wins,
        losses = result.losses,
        win_rate = result.win_rate,
        final_capital = result.final_capital,
        max_drawdown_pct = result.max_drawdown_pct,
        "backtest complete"
    );
    Ok(result)
}

fn utc_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

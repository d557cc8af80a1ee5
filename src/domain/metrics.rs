//! Backtest performance statistics.

use serde::{Deserialize, Serialize};

use super::trade::ClosedTrade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent, 0..=100.
    pub win_rate: f64,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub profit: f64,
    pub profit_pct: f64,
    /// 0.0 when there are no losing trades.
    pub profit_factor: f64,
    pub max_drawdown_pct: f64,
    /// 0.0 with fewer than two trades or zero variance.
    pub sharpe_ratio: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub halted_by_drawdown: bool,
    pub equity_curve: Vec<f64>,
    pub trades: Vec<ClosedTrade>,
}

impl BacktestResult {
    pub fn compute(initial_capital: f64, trades: Vec<ClosedTrade>, halted_by_drawdown: bool) -> Self {
        let equity_curve: Vec<f64> = std::iter::once(initial_capital)
            .chain(trades.iter().map(|t| t.capital_after))
            .collect();
        let final_capital = equity_curve.last().copied().unwrap_or(initial_capital);
        let profit = final_capital - initial_capital;
        let profit_pct = if initial_capital > 0.0 {
            profit / initial_capital * 100.0
        } else {
            0.0
        };

        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;

        for trade in &trades {
            if trade.is_win() {
                wins += 1;
            } else {
                losses += 1;
            }
            if trade.pnl > 0.0 {
                gross_profit += trade.pnl;
                largest_win = largest_win.max(trade.pnl);
            } else if trade.pnl < 0.0 {
                gross_loss += trade.pnl.abs();
                largest_loss = largest_loss.max(trade.pnl.abs());
            }
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else {
            0.0
        };

        let winners = trades.iter().filter(|t| t.pnl > 0.0).count();
        let losers = trades.iter().filter(|t| t.pnl < 0.0).count();
        let avg_win = if winners > 0 {
            gross_profit / winners as f64
        } else {
            0.0
        };
        let avg_loss = if losers > 0 {
            gross_loss / losers as f64
        } else {
            0.0
        };

        let returns: Vec<f64> = equity_curve
            .windows(2)
            .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
            .collect();

        BacktestResult {
            total_trades,
            wins,
            losses,
            win_rate,
            initial_capital,
            final_capital,
            profit,
            profit_pct,
            profit_factor,
            max_drawdown_pct: compute_drawdown_pct(&equity_curve),
            sharpe_ratio: compute_sharpe(&returns),
            gross_profit,
            gross_loss,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            halted_by_drawdown,
            equity_curve,
            trades,
        }
    }
}

/// Largest peak-to-trough decline, in percent of the peak.
pub fn compute_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - equity) / peak * 100.0);
        }
    }
    max_dd
}

/// Mean over population standard deviation of per-trade returns.
pub fn compute_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev > 1e-12 && std_dev.is_finite() {
        mean / std_dev
    } else {
        0.0
    }
}

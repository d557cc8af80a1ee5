//! ATR-based stop/target placement and fixed-fractional sizing.

use serde::{Deserialize, Serialize};

use super::error::TradeSetupError;
use super::signal::Side;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Stop distance in ATRs.
    pub stop_atr_multiple: f64,
    /// First target in multiples of the stop distance.
    pub tp1_multiple: f64,
    pub tp2_multiple: f64,
    /// Percent of capital risked per trade.
    pub risk_pct: f64,
    /// Trailing distance in multiples of the stop distance.
    pub trail_multiple: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_atr_multiple: 1.5,
            tp1_multiple: 2.0,
            tp2_multiple: 3.0,
            risk_pct: 1.0,
            trail_multiple: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub risk_per_unit: f64,
    pub risk_reward_1: f64,
    pub risk_reward_2: f64,
    pub risk_amount: f64,
    pub position_size: f64,
}

impl RiskLevels {
    /// Degenerate levels for a setup with no measurable volatility: every
    /// price sits at the entry and no position is sized.
    pub fn flat(side: Side, entry_price: f64, risk_amount: f64) -> Self {
        Self {
            side,
            entry_price,
            stop_loss: entry_price,
            take_profit_1: entry_price,
            take_profit_2: entry_price,
            risk_per_unit: 0.0,
            risk_reward_1: 0.0,
            risk_reward_2: 0.0,
            risk_amount,
            position_size: 0.0,
        }
    }

    /// Whether the first target pays at least `min` times the risk.
    pub fn meets(&self, min: f64) -> bool {
        self.risk_reward_1 >= min
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskManager {
    config: RiskConfig,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn risk_amount(&self, capital: f64) -> f64 {
        capital * self.config.risk_pct / 100.0
    }

    pub fn levels(
        &self,
        side: Side,
        entry_price: f64,
        atr: f64,
        capital: f64,
    ) -> Result<RiskLevels, TradeSetupError> {
        for (name, value) in [("entry price", entry_price), ("atr", atr), ("capital", capital)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TradeSetupError::InvalidRiskInput {
                    reason: format!("{name} must be positive and finite, got {value}"),
                });
            }
        }

        let sign = side.sign();
        let stop_loss = entry_price - sign * self.config.stop_atr_multiple * atr;
        let risk_per_unit = (entry_price - stop_loss).abs();
        let risk_amount = self.risk_amount(capital);

        Ok(RiskLevels {
            side,
            entry_price,
            stop_loss,
            take_profit_1: entry_price + sign * self.config.tp1_multiple * risk_per_unit,
            take_profit_2: entry_price + sign * self.config.tp2_multiple * risk_per_unit,
            risk_per_unit,
            risk_reward_1: self.config.tp1_multiple,
            risk_reward_2: self.config.tp2_multiple,
            risk_amount,
            position_size: risk_amount / risk_per_unit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn long_levels() {
        let rm = RiskManager::default();
        let lv = rm.levels(Side::Long, 100.0, 2.0, 10_000.0).unwrap();

        assert_relative_eq!(lv.stop_loss, 97.0);
        assert_relative_eq!(lv.risk_per_unit, 3.0);
        assert_relative_eq!(lv.take_profit_1, 106.0);
        assert_relative_eq!(lv.take_profit_2, 109.0);
        assert_relative_eq!(lv.risk_amount, 100.0);
        assert_relative_eq!(lv.position_size, 100.0 / 3.0);
        assert_relative_eq!(lv.risk_reward_1, 2.0);
        assert_relative_eq!(lv.risk_reward_2, 3.0);
    }

    #[test]
    fn short_levels_mirror() {
        let rm = RiskManager::default();
        let lv = rm.levels(Side::Short, 100.0, 2.0, 10_000.0).unwrap();

        assert_relative_eq!(lv.stop_loss, 103.0);
        assert_relative_eq!(lv.take_profit_1, 94.0);
        assert_relative_eq!(lv.take_profit_2, 91.0);
        assert!(lv.take_profit_2 < lv.take_profit_1);
    }

    #[test]
    fn custom_multiples() {
        let rm = RiskManager::new(RiskConfig {
            stop_atr_multiple: 1.0,
            tp1_multiple: 1.5,
            tp2_multiple: 4.0,
            risk_pct: 2.0,
            trail_multiple: 1.0,
        });
        let lv = rm.levels(Side::Long, 50.0, 1.0, 1_000.0).unwrap();
        assert_relative_eq!(lv.stop_loss, 49.0);
        assert_relative_eq!(lv.take_profit_1, 51.5);
        assert_relative_eq!(lv.take_profit_2, 54.0);
        assert_relative_eq!(lv.risk_amount, 20.0);
        assert!(!lv.meets(2.0));
        assert!(lv.meets(1.5));
    }

    #[test]
    fn rejects_bad_inputs() {
        let rm = RiskManager::default();
        for (entry, atr, capital) in [
            (100.0, 0.0, 1_000.0),
            (100.0, -1.0, 1_000.0),
            (100.0, 1.0, 0.0),
            (0.0, 1.0, 1_000.0),
            (100.0, f64::NAN, 1_000.0),
            (100.0, 1.0, f64::INFINITY),
        ] {
            let err = rm.levels(Side::Long, entry, atr, capital).unwrap_err();
            assert!(matches!(err, TradeSetupError::InvalidRiskInput { .. }));
        }
    }

    #[test]
    fn flat_levels() {
        let lv = RiskLevels::flat(Side::Short, 42.0, 10.0);
        assert_eq!(lv.stop_loss, 42.0);
        assert_eq!(lv.take_profit_2, 42.0);
        assert_eq!(lv.position_size, 0.0);
        assert!(!lv.meets(2.0));
    }
}

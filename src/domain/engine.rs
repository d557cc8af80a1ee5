//! Engine facade: one immutable configuration, two operations.

use serde::{Deserialize, Serialize};

use super::backtest::{run_backtest, BacktestConfig, BacktestLimits};
use super::candle::Candle;
use super::config_validation::validate_engine_config;
use super::error::TradeSetupError;
use super::indicator::{IndicatorConfig, IndicatorSeries};
use super::metrics::BacktestResult;
use super::risk::{RiskConfig, RiskLevels, RiskManager};
use super::scorer::{Rubric, ScoreBreakdown, SetupScorer};
use super::signal::{Side, Signal, Trend};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub min_score: u32,
    pub risk_reward_min: f64,
    pub max_daily_loss_pct: f64,
    pub max_drawdown_pct: f64,
    pub indicators: IndicatorConfig,
    pub rubric: Rubric,
    pub risk: RiskConfig,
    pub backtest: BacktestConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_score: 70,
            risk_reward_min: 2.0,
            max_daily_loss_pct: 2.0,
            max_drawdown_pct: 10.0,
            indicators: IndicatorConfig::default(),
            rubric: Rubric::default(),
            risk: RiskConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

/// Evaluation of the most recent candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetupResult {
    pub signal: Signal,
    pub score: u32,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub trend: Trend,
    pub rsi_value: f64,
    pub ema_20: f64,
    pub ema_50: f64,
    pub atr_value: f64,
    pub risk_reward_1: f64,
    pub risk_reward_2: f64,
    pub risk_amount: f64,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub timestamp: i64,
    pub index: usize,
    pub macd_value: f64,
    pub macd_signal: f64,
    pub volume_ratio: f64,
    pub patterns: Vec<String>,
    pub breakdown: ScoreBreakdown,
}

/// Stateless facade over the scorer, risk manager and backtester.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    scorer: SetupScorer,
    risk: RiskManager,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, TradeSetupError> {
        validate_engine_config(&config)?;
        let scorer = SetupScorer::new(
            config.indicators.clone(),
            config.rubric.clone(),
            config.min_score,
        );
        let risk = RiskManager::new(config.risk.clone());
        Ok(Self {
            config,
            scorer,
            risk,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SetupScorer {
        &self.scorer
    }

    pub fn risk_manager(&self) -> &RiskManager {
        &self.risk
    }

    /// Score the setup at the last candle and attach risk levels.
    pub fn evaluate(&self, candles: &[Candle], capital: f64) -> Result<SetupResult, TradeSetupError> {
        if !capital.is_finite() || capital <= 0.0 {
            return Err(TradeSetupError::InvalidRiskInput {
                reason: format!("capital must be positive and finite, got {capital}"),
            });
        }
        let series = IndicatorSeries::compute(candles, &self.config.indicators)?;
        let index = series.len() - 1;
        let candle = candles[index];
        let assessment = self.scorer.assess(candles, &series, index).ok_or(
            TradeSetupError::InsufficientData {
                have: candles.len(),
                need: self.config.indicators.min_candles(),
            },
        )?;

        let mut signal = assessment.signal;
        let mut warnings = assessment.warnings;
        let side = signal
            .side()
            .or(assessment.trend.side())
            .unwrap_or(Side::Long);
        let atr = assessment.indicators.atr;
        let levels = if atr > 0.0 {
            self.risk.levels(side, candle.close, atr, capital)?
        } else {
            RiskLevels::flat(side, candle.close, self.risk.risk_amount(capital))
        };

        if signal != Signal::Wait && !levels.meets(self.config.risk_reward_min) {
            warnings.push(format!(
                "risk:reward 1:{:.2} below minimum 1:{:.2}",
                levels.risk_reward_1, self.config.risk_reward_min
            ));
            signal = Signal::Wait;
        }

        tracing::debug!(
            index,
            signal = %signal,
            score = assessment.score,
            trend = %assessment.trend,
            "setup evaluated"
        );

        let snap = assessment.indicators;
        Ok(SetupResult {
            signal,
            score: assessment.score,
            confidence: f64::from(assessment.score) / 100.0,
            entry_price: levels.entry_price,
            stop_loss: levels.stop_loss,
            take_profit_1: levels.take_profit_1,
            take_profit_2: levels.take_profit_2,
            trend: assessment.trend,
            rsi_value: snap.rsi,
            ema_20: snap.ema_fast,
            ema_50: snap.ema_slow,
            atr_value: atr,
            risk_reward_1: levels.risk_reward_1,
            risk_reward_2: levels.risk_reward_2,
            risk_amount: levels.risk_amount,
            reasons: assessment.reasons,
            warnings,
            timestamp: candle.timestamp,
            index,
            macd_value: snap.macd,
            macd_signal: snap.macd_signal,
            volume_ratio: assessment.volume_ratio,
            patterns: snap.patterns.names().into_iter().map(String::from).collect(),
            breakdown: assessment.breakdown,
        })
    }

    /// Replay the scorer over `candles` starting from `initial_capital`.
    pub fn backtest(&self, candles: &[Candle], initial_capital: f64) -> Result<BacktestResult, TradeSetupError> {
        run_backtest(
            candles,
            initial_capital,
            &self.scorer,
            &self.config.indicators,
            &self.risk,
            &self.limits(),
        )
    }

    pub fn limits(&self) -> BacktestLimits {
        BacktestLimits {
            min_candles: self.config.backtest.min_candles,
            risk_reward_min: self.config.risk_reward_min,
            max_daily_loss_pct: self.config.max_daily_loss_pct,
            max_drawdown_pct: self.config.max_drawdown_pct,
        }
    }
}

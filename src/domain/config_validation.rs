//! Engine configuration loading and validation.
//!
//! `build_engine_config` reads every section through a `ConfigPort`, falling
//! back to defaults for missing keys, then validates the assembled value.
//! `validate_engine_config` is also what `Engine::new` runs, so a config
//! built in code gets the same checks as one read from a file.

use std::str::FromStr;

use crate::domain::backtest::BacktestConfig;
use crate::domain::engine::EngineConfig;
use crate::domain::error::TradeSetupError;
use crate::domain::indicator::IndicatorConfig;
use crate::domain::risk::RiskConfig;
use crate::domain::scorer::Rubric;
use crate::ports::config_port::ConfigPort;

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, TradeSetupError> {
    let d = EngineConfig::default();

    let indicators = IndicatorConfig {
        ema_fast: int(config, "indicators", "ema_fast", d.indicators.ema_fast)?,
        ema_slow: int(config, "indicators", "ema_slow", d.indicators.ema_slow)?,
        rsi_period: int(config, "indicators", "rsi_period", d.indicators.rsi_period)?,
        atr_period: int(config, "indicators", "atr_period", d.indicators.atr_period)?,
        macd_fast: int(config, "indicators", "macd_fast", d.indicators.macd_fast)?,
        macd_slow: int(config, "indicators", "macd_slow", d.indicators.macd_slow)?,
        macd_signal: int(config, "indicators", "macd_signal", d.indicators.macd_signal)?,
        volume_period: int(config, "indicators", "volume_period", d.indicators.volume_period)?,
    };

    let r = &d.rubric;
    let rubric = Rubric {
        trend_weight: float(config, "rubric", "trend_weight", r.trend_weight)?,
        pullback_weight: float(config, "rubric", "pullback_weight", r.pullback_weight)?,
        rsi_weight: float(config, "rubric", "rsi_weight", r.rsi_weight)?,
        volume_weight: float(config, "rubric", "volume_weight", r.volume_weight)?,
        pattern_weight: float(config, "rubric", "pattern_weight", r.pattern_weight)?,
        trend_noise_pct: float(config, "rubric", "trend_noise_pct", r.trend_noise_pct)?,
        trend_moderate_pct: float(config, "rubric", "trend_moderate_pct", r.trend_moderate_pct)?,
        trend_strong_pct: float(config, "rubric", "trend_strong_pct", r.trend_strong_pct)?,
        trend_moderate_credit: float(
            config,
            "rubric",
            "trend_moderate_credit",
            r.trend_moderate_credit,
        )?,
        trend_weak_credit: float(config, "rubric", "trend_weak_credit", r.trend_weak_credit)?,
        pullback_full_atr: float(config, "rubric", "pullback_full_atr", r.pullback_full_atr)?,
        pullback_zero_atr: float(config, "rubric", "pullback_zero_atr", r.pullback_zero_atr)?,
        rsi_full_low: float(config, "rubric", "rsi_full_low", r.rsi_full_low)?,
        rsi_full_high: float(config, "rubric", "rsi_full_high", r.rsi_full_high)?,
        rsi_zero_low: float(config, "rubric", "rsi_zero_low", r.rsi_zero_low)?,
        rsi_zero_high: float(config, "rubric", "rsi_zero_high", r.rsi_zero_high)?,
        volume_zero_ratio: float(config, "rubric", "volume_zero_ratio", r.volume_zero_ratio)?,
        volume_full_ratio: float(config, "rubric", "volume_full_ratio", r.volume_full_ratio)?,
        reason_threshold: float(config, "rubric", "reason_threshold", r.reason_threshold)?,
    };

    let risk = RiskConfig {
        stop_atr_multiple: float(config, "risk", "stop_atr_multiple", d.risk.stop_atr_multiple)?,
        tp1_multiple: float(config, "risk", "tp1_multiple", d.risk.tp1_multiple)?,
        tp2_multiple: float(config, "risk", "tp2_multiple", d.risk.tp2_multiple)?,
        risk_pct: float(config, "risk", "risk_pct", d.risk.risk_pct)?,
        trail_multiple: float(config, "risk", "trail_multiple", d.risk.trail_multiple)?,
    };

    let backtest = BacktestConfig {
        initial_capital: float(
            config,
            "backtest",
            "initial_capital",
            d.backtest.initial_capital,
        )?,
        min_candles: int(config, "backtest", "min_candles", d.backtest.min_candles)?,
    };

    let engine = EngineConfig {
        min_score: int(config, "engine", "min_score", d.min_score)?,
        risk_reward_min: float(config, "engine", "risk_reward_min", d.risk_reward_min)?,
        max_daily_loss_pct: float(config, "engine", "max_daily_loss_pct", d.max_daily_loss_pct)?,
        max_drawdown_pct: float(config, "engine", "max_drawdown_pct", d.max_drawdown_pct)?,
        indicators,
        rubric,
        risk,
        backtest,
    };

    validate_engine_config(&engine)?;
    Ok(engine)
}

pub fn validate_engine_config(config: &EngineConfig) -> Result<(), TradeSetupError> {
    validate_engine_section(config)?;
    validate_indicators(&config.indicators)?;
    validate_rubric(&config.rubric)?;
    validate_risk(&config.risk)?;
    validate_backtest(&config.backtest, &config.indicators)?;
    Ok(())
}

fn float(config: &dyn ConfigPort, section: &str, key: &str, default: f64) -> Result<f64, TradeSetupError> {
    reject_malformed::<f64>(config, section, key, "a number")?;
    Ok(config.get_double(section, key, default))
}

fn int<T>(config: &dyn ConfigPort, section: &str, key: &str, default: T) -> Result<T, TradeSetupError>
where
    T: TryFrom<i64> + TryInto<i64> + Copy,
{
    reject_malformed::<i64>(config, section, key, "an integer")?;
    let fallback: i64 = default.try_into().unwrap_or(i64::MAX);
    let value = config.get_int(section, key, fallback);
    T::try_from(value).map_err(|_| {
        TradeSetupError::invalid_config(section, key, format!("{value} is out of range"))
    })
}

fn reject_malformed<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    expected: &str,
) -> Result<(), TradeSetupError> {
    match config.get_string(section, key) {
        Some(raw) if raw.trim().parse::<T>().is_err() => Err(TradeSetupError::invalid_config(
            section,
            key,
            format!("expected {expected}, got '{raw}'"),
        )),
        _ => Ok(()),
    }
}

fn positive(section: &str, key: &str, value: f64) -> Result<(), TradeSetupError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(TradeSetupError::invalid_config(
            section,
            key,
            format!("must be positive, got {value}"),
        ));
    }
    Ok(())
}

fn within(section: &str, key: &str, value: f64, lo: f64, hi: f64) -> Result<(), TradeSetupError> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(TradeSetupError::invalid_config(
            section,
            key,
            format!("must be within {lo}..={hi}, got {value}"),
        ));
    }
    Ok(())
}

fn ordered(section: &str, lower: (&str, f64), upper: (&str, f64)) -> Result<(), TradeSetupError> {
    if lower.1 >= upper.1 {
        return Err(TradeSetupError::invalid_config(
            section,
            lower.0,
            format!("must be below {} ({} >= {})", upper.0, lower.1, upper.1),
        ));
    }
    Ok(())
}

fn validate_engine_section(config: &EngineConfig) -> Result<(), TradeSetupError> {
    if config.min_score > 100 {
        return Err(TradeSetupError::invalid_config(
            "engine",
            "min_score",
            format!("must be within 0..=100, got {}", config.min_score),
        ));
    }
    within("engine", "risk_reward_min", config.risk_reward_min, 0.0, f64::MAX)?;
    within("engine", "max_daily_loss_pct", config.max_daily_loss_pct, f64::MIN_POSITIVE, 100.0)?;
    within("engine", "max_drawdown_pct", config.max_drawdown_pct, f64::MIN_POSITIVE, 100.0)?;
    Ok(())
}

fn validate_indicators(ind: &IndicatorConfig) -> Result<(), TradeSetupError> {
    for (key, period) in [
        ("ema_fast", ind.ema_fast),
        ("ema_slow", ind.ema_slow),
        ("rsi_period", ind.rsi_period),
        ("atr_period", ind.atr_period),
        ("macd_fast", ind.macd_fast),
        ("macd_slow", ind.macd_slow),
        ("macd_signal", ind.macd_signal),
        ("volume_period", ind.volume_period),
    ] {
        if period == 0 {
            return Err(TradeSetupError::invalid_config(
                "indicators",
                key,
                "period must be positive",
            ));
        }
    }
    ordered(
        "indicators",
        ("ema_fast", ind.ema_fast as f64),
        ("ema_slow", ind.ema_slow as f64),
    )?;
    ordered(
        "indicators",
        ("macd_fast", ind.macd_fast as f64),
        ("macd_slow", ind.macd_slow as f64),
    )?;
    Ok(())
}

fn validate_rubric(r: &Rubric) -> Result<(), TradeSetupError> {
    for (key, weight) in [
        ("trend_weight", r.trend_weight),
        ("pullback_weight", r.pullback_weight),
        ("rsi_weight", r.rsi_weight),
        ("volume_weight", r.volume_weight),
        ("pattern_weight", r.pattern_weight),
    ] {
        within("rubric", key, weight, 0.0, 100.0)?;
    }
    if r.total_weight() > 100.0 {
        return Err(TradeSetupError::invalid_config(
            "rubric",
            "weights",
            format!("weights sum to {}, must not exceed 100", r.total_weight()),
        ));
    }

    within("rubric", "trend_noise_pct", r.trend_noise_pct, 0.0, f64::MAX)?;
    ordered(
        "rubric",
        ("trend_noise_pct", r.trend_noise_pct),
        ("trend_moderate_pct", r.trend_moderate_pct),
    )?;
    ordered(
        "rubric",
        ("trend_moderate_pct", r.trend_moderate_pct),
        ("trend_strong_pct", r.trend_strong_pct),
    )?;
    within("rubric", "trend_moderate_credit", r.trend_moderate_credit, 0.0, 1.0)?;
    within("rubric", "trend_weak_credit", r.trend_weak_credit, 0.0, 1.0)?;

    within("rubric", "pullback_full_atr", r.pullback_full_atr, 0.0, f64::MAX)?;
    ordered(
        "rubric",
        ("pullback_full_atr", r.pullback_full_atr),
        ("pullback_zero_atr", r.pullback_zero_atr),
    )?;

    within("rubric", "rsi_zero_low", r.rsi_zero_low, 0.0, 100.0)?;
    within("rubric", "rsi_zero_high", r.rsi_zero_high, 0.0, 100.0)?;
    ordered(
        "rubric",
        ("rsi_zero_low", r.rsi_zero_low),
        ("rsi_full_low", r.rsi_full_low),
    )?;
    if r.rsi_full_low > r.rsi_full_high {
        return Err(TradeSetupError::invalid_config(
            "rubric",
            "rsi_full_low",
            format!(
                "must not exceed rsi_full_high ({} > {})",
                r.rsi_full_low, r.rsi_full_high
            ),
        ));
    }
    ordered(
        "rubric",
        ("rsi_full_high", r.rsi_full_high),
        ("rsi_zero_high", r.rsi_zero_high),
    )?;

    within("rubric", "volume_zero_ratio", r.volume_zero_ratio, 0.0, f64::MAX)?;
    ordered(
        "rubric",
        ("volume_zero_ratio", r.volume_zero_ratio),
        ("volume_full_ratio", r.volume_full_ratio),
    )?;

    within("rubric", "reason_threshold", r.reason_threshold, 0.0, 1.0)?;
    Ok(())
}

fn validate_risk(risk: &RiskConfig) -> Result<(), TradeSetupError> {
    positive("risk", "stop_atr_multiple", risk.stop_atr_multiple)?;
    positive("risk", "tp1_multiple", risk.tp1_multiple)?;
    ordered(
        "risk",
        ("tp1_multiple", risk.tp1_multiple),
        ("tp2_multiple", risk.tp2_multiple),
    )?;
    positive("risk", "risk_pct", risk.risk_pct)?;
    within("risk", "risk_pct", risk.risk_pct, 0.0, 100.0)?;
    positive("risk", "trail_multiple", risk.trail_multiple)?;
    Ok(())
}

fn validate_backtest(bt: &BacktestConfig, ind: &IndicatorConfig) -> Result<(), TradeSetupError> {
    positive("backtest", "initial_capital", bt.initial_capital)?;
    if bt.min_candles < ind.min_candles() {
        return Err(TradeSetupError::invalid_config(
            "backtest",
            "min_candles",
            format!(
                "must be at least the indicator warm-up of {} candles, got {}",
                ind.min_candles(),
                bt.min_candles
            ),
        ));
    }
    Ok(())
}

//! Technical indicator library.
//!
//! Each submodule computes one series as `Vec<Option<f64>>` aligned 1:1 with
//! the candle slice, `None` where the formula lacks history. `IndicatorSeries`
//! bundles every series the scorer reads and masks them all to a common
//! warm-up so that an index is either fully defined or fully undefined.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod pattern;
pub mod rsi;
pub mod volume;

use serde::{Deserialize, Serialize};

use crate::domain::candle::{validate_candles, Candle};
use crate::domain::error::TradeSetupError;

pub use pattern::PatternFlags;

/// Indicator periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub volume_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_slow: 50,
            rsi_period: 14,
            atr_period: 14,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            volume_period: 20,
        }
    }
}

impl IndicatorConfig {
    /// First index at which every series is defined.
    pub fn warm_up(&self) -> usize {
        [
            self.ema_slow.saturating_sub(1),
            self.rsi_period,
            self.atr_period.saturating_sub(1),
            (self.macd_slow + self.macd_signal).saturating_sub(2),
            self.volume_period,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// Candles needed to evaluate at least one index.
    pub fn min_candles(&self) -> usize {
        self.warm_up() + 1
    }
}

/// Indicator values at a single index, all defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub atr: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub volume_avg: f64,
    pub patterns: PatternFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub warm_up: usize,
    pub ema_fast: Vec<Option<f64>>,
    pub ema_slow: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_histogram: Vec<Option<f64>>,
    pub volume_avg: Vec<Option<f64>>,
    pub patterns: Vec<PatternFlags>,
}

impl IndicatorSeries {
    /// Validate `candles` and compute every series.
    ///
    /// Fails with `InsufficientData` when fewer than `config.min_candles()`
    /// candles are supplied.
    pub fn compute(candles: &[Candle], config: &IndicatorConfig) -> Result<Self, TradeSetupError> {
        let need = config.min_candles();
        if candles.len() < need {
            return Err(TradeSetupError::InsufficientData {
                have: candles.len(),
                need,
            });
        }
        validate_candles(candles)?;

        let warm_up = config.warm_up();
        let mask = |mut series: Vec<Option<f64>>| {
            series.iter_mut().take(warm_up).for_each(|v| *v = None);
            series
        };

        let macd = macd::calculate_macd(
            candles,
            config.macd_fast,
            config.macd_slow,
            config.macd_signal,
        );

        Ok(Self {
            warm_up,
            ema_fast: mask(ema::calculate_ema(candles, config.ema_fast)),
            ema_slow: mask(ema::calculate_ema(candles, config.ema_slow)),
            rsi: mask(rsi::calculate_rsi(candles, config.rsi_period)),
            atr: mask(atr::calculate_atr(candles, config.atr_period)),
            macd: mask(macd.line),
            macd_signal: mask(macd.signal),
            macd_histogram: mask(macd.histogram),
            volume_avg: mask(volume::calculate_volume_avg(candles, config.volume_period)),
            patterns: pattern::detect_patterns(candles),
        })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// All values at `index`, or `None` before warm-up or out of range.
    pub fn at(&self, index: usize) -> Option<IndicatorSnapshot> {
        if index < self.warm_up {
            return None;
        }
        Some(IndicatorSnapshot {
            ema_fast: (*self.ema_fast.get(index)?)?,
            ema_slow: (*self.ema_slow.get(index)?)?,
            rsi: (*self.rsi.get(index)?)?,
            atr: (*self.atr.get(index)?)?,
            macd: (*self.macd.get(index)?)?,
            macd_signal: (*self.macd_signal.get(index)?)?,
            macd_histogram: (*self.macd_histogram.get(index)?)?,
            volume_avg: (*self.volume_avg.get(index)?)?,
            patterns: *self.patterns.get(index)?,
        })
    }
}

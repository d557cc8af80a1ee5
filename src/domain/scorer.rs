//! Weighted multi-factor setup scoring.
//!
//! Five independent factors each earn a credit fraction in `[0, 1]` that is
//! scaled by the factor's weight. The rounded sum is the setup score; the
//! trend factor alone decides which direction the score may be spent on.

use serde::{Deserialize, Serialize};

use super::candle::Candle;
use super::indicator::{IndicatorConfig, IndicatorSeries, IndicatorSnapshot};
use super::signal::{Signal, Trend};

/// Factor weights and thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    pub trend_weight: f64,
    pub pullback_weight: f64,
    pub rsi_weight: f64,
    pub volume_weight: f64,
    pub pattern_weight: f64,

    /// EMA spread (% of the slow EMA) below which the market is lateral.
    pub trend_noise_pct: f64,
    pub trend_moderate_pct: f64,
    pub trend_strong_pct: f64,
    pub trend_moderate_credit: f64,
    pub trend_weak_credit: f64,

    /// Distance from the fast EMA, in ATRs.
    pub pullback_full_atr: f64,
    pub pullback_zero_atr: f64,

    pub rsi_full_low: f64,
    pub rsi_full_high: f64,
    pub rsi_zero_low: f64,
    pub rsi_zero_high: f64,

    /// Current volume over its trailing average.
    pub volume_zero_ratio: f64,
    pub volume_full_ratio: f64,

    /// Credit fraction at which a factor is reported as a reason.
    pub reason_threshold: f64,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            trend_weight: 25.0,
            pullback_weight: 25.0,
            rsi_weight: 20.0,
            volume_weight: 15.0,
            pattern_weight: 15.0,
            trend_noise_pct: 0.05,
            trend_moderate_pct: 0.2,
            trend_strong_pct: 0.5,
            trend_moderate_credit: 0.8,
            trend_weak_credit: 0.6,
            pullback_full_atr: 0.5,
            pullback_zero_atr: 2.0,
            rsi_full_low: 30.0,
            rsi_full_high: 70.0,
            rsi_zero_low: 20.0,
            rsi_zero_high: 80.0,
            volume_zero_ratio: 0.5,
            volume_full_ratio: 1.5,
            reason_threshold: 0.6,
        }
    }
}

impl Rubric {
    pub fn total_weight(&self) -> f64 {
        self.trend_weight
            + self.pullback_weight
            + self.rsi_weight
            + self.volume_weight
            + self.pattern_weight
    }
}

/// Points earned per factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub trend: f64,
    pub pullback: f64,
    pub rsi: f64,
    pub volume: f64,
    pub pattern: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.trend + self.pullback + self.rsi + self.volume + self.pattern
    }
}

/// Scorer verdict at one candle index, before any risk gating.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub index: usize,
    pub signal: Signal,
    pub trend: Trend,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
    pub indicators: IndicatorSnapshot,
    pub close: f64,
    pub volume_ratio: f64,
    /// Signed distance from the fast EMA in ATRs, positive on the trend side.
    pub pullback_offset: Option<f64>,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
}

/// Produces an entry signal per bar. The backtest loop depends only on this.
pub trait SignalSource {
    fn signal_at(&self, candles: &[Candle], series: &IndicatorSeries, index: usize) -> Signal;
}

#[derive(Debug, Clone)]
pub struct SetupScorer {
    indicators: IndicatorConfig,
    rubric: Rubric,
    min_score: u32,
}

impl SetupScorer {
    pub fn new(indicators: IndicatorConfig, rubric: Rubric, min_score: u32) -> Self {
        Self {
            indicators,
            rubric,
            min_score,
        }
    }

    pub fn indicator_config(&self) -> &IndicatorConfig {
        &self.indicators
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    pub fn min_score(&self) -> u32 {
        self.min_score
    }

    /// Score the setup at `index`. Returns `None` before warm-up or past the
    /// end of the series.
    pub fn assess(
        &self,
        candles: &[Candle],
        series: &IndicatorSeries,
        index: usize,
    ) -> Option<Assessment> {
        let snap = series.at(index)?;
        let candle = candles.get(index)?;
        let r = &self.rubric;
        let mut reasons = Vec::new();
        let mut warnings = Vec::new();

        // Trend
        let spread_pct = (snap.ema_fast - snap.ema_slow).abs() / snap.ema_slow * 100.0;
        let (trend, trend_credit) = if spread_pct < r.trend_noise_pct {
            (Trend::Lateral, 0.0)
        } else {
            let trend = if snap.ema_fast > snap.ema_slow {
                Trend::Bullish
            } else {
                Trend::Bearish
            };
            let credit = if spread_pct >= r.trend_strong_pct {
                1.0
            } else if spread_pct >= r.trend_moderate_pct {
                r.trend_moderate_credit
            } else {
                r.trend_weak_credit
            };
            (trend, credit)
        };
        match trend {
            Trend::Lateral => warnings.push(format!(
                "lateral market: EMA spread {spread_pct:.3}% is within noise"
            )),
            Trend::Bullish if trend_credit >= r.reason_threshold => reasons.push(format!(
                "uptrend: EMA{} above EMA{} by {spread_pct:.2}%",
                self.indicators.ema_fast, self.indicators.ema_slow
            )),
            Trend::Bearish if trend_credit >= r.reason_threshold => reasons.push(format!(
                "downtrend: EMA{} below EMA{} by {spread_pct:.2}%",
                self.indicators.ema_fast, self.indicators.ema_slow
            )),
            _ => {}
        }

        // Pullback
        let pullback_offset = match trend.side() {
            Some(side) if snap.atr > 0.0 => {
                Some(side.sign() * (candle.close - snap.ema_fast) / snap.atr)
            }
            _ => None,
        };
        let pullback_credit = match pullback_offset {
            Some(offset) if offset < 0.0 => {
                warnings.push(format!(
                    "price on the wrong side of EMA{}",
                    self.indicators.ema_fast
                ));
                0.0
            }
            Some(offset) => {
                if offset > r.pullback_full_atr {
                    warnings.push(format!(
                        "price extended {offset:.2} ATR from EMA{}",
                        self.indicators.ema_fast
                    ));
                }
                if offset <= r.pullback_full_atr {
                    1.0
                } else {
                    ramp(offset, r.pullback_zero_atr, r.pullback_full_atr)
                }
            }
            None => 0.0,
        };
        if pullback_credit >= r.reason_threshold {
            if let Some(offset) = pullback_offset {
                reasons.push(format!(
                    "pullback to EMA{} ({offset:.2} ATR)",
                    self.indicators.ema_fast
                ));
            }
        }

        // RSI
        let rsi_credit = if snap.rsi < r.rsi_full_low {
            ramp(snap.rsi, r.rsi_zero_low, r.rsi_full_low)
        } else if snap.rsi > r.rsi_full_high {
            ramp(snap.rsi, r.rsi_zero_high, r.rsi_full_high)
        } else {
            1.0
        };
        if rsi_credit >= r.reason_threshold {
            reasons.push(format!("RSI {:.1} outside exhaustion zones", snap.rsi));
        }
        if snap.rsi < r.rsi_full_low || snap.rsi > r.rsi_full_high {
            warnings.push(format!(
                "RSI {:.1} outside {}-{}",
                snap.rsi, r.rsi_full_low, r.rsi_full_high
            ));
        }

        // Volume
        let volume_ratio = if snap.volume_avg > 0.0 {
            candle.volume / snap.volume_avg
        } else {
            1.0
        };
        let volume_credit = ramp(volume_ratio, r.volume_zero_ratio, r.volume_full_ratio);
        if volume_credit >= r.reason_threshold {
            reasons.push(format!("volume {volume_ratio:.2}x average"));
        }
        if volume_ratio < 1.0 {
            warnings.push(format!("volume below average ({volume_ratio:.2}x)"));
        }

        // Pattern
        let patterns = snap.patterns;
        let aligned = match trend {
            Trend::Bullish => patterns.bullish(),
            Trend::Bearish => patterns.bearish(),
            Trend::Lateral => false,
        };
        let pattern_credit = if aligned { 1.0 } else { 0.0 };
        if aligned {
            let names: Vec<&str> = patterns
                .names()
                .into_iter()
                .filter(|n| *n != "doji")
                .collect();
            reasons.push(format!("{} confirms the trend", names.join(" + ")));
        }
        if patterns.doji {
            warnings.push("doji: indecision candle".to_string());
        }

        let breakdown = ScoreBreakdown {
            trend: r.trend_weight * trend_credit,
            pullback: r.pullback_weight * pullback_credit,
            rsi: r.rsi_weight * rsi_credit,
            volume: r.volume_weight * volume_credit,
            pattern: r.pattern_weight * pattern_credit,
        };
        let score = breakdown.total().round().clamp(0.0, 100.0) as u32;

        if score < self.min_score {
            warnings.push(format!("score {score} below minimum {}", self.min_score));
        }

        let signal = match trend.side() {
            Some(side) if score >= self.min_score => side.signal(),
            _ => Signal::Wait,
        };

        Some(Assessment {
            index,
            signal,
            trend,
            score,
            breakdown,
            indicators: snap,
            close: candle.close,
            volume_ratio,
            pullback_offset,
            reasons,
            warnings,
        })
    }
}

impl SignalSource for SetupScorer {
    fn signal_at(&self, candles: &[Candle], series: &IndicatorSeries, index: usize) -> Signal {
        self.assess(candles, series, index)
            .map_or(Signal::Wait, |a| a.signal)
    }
}

/// Linear credit: 0 at `zero`, 1 at `full`, clamped. Works in either direction.
fn ramp(x: f64, zero: f64, full: f64) -> f64 {
    if full == zero {
        return if x >= full { 1.0 } else { 0.0 };
    }
    ((x - zero) / (full - zero)).clamp(0.0, 1.0)
}

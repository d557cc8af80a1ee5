//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line, seeded with the SMA of its first
//! `signal` defined values
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is defined from slow-1, the signal and histogram from
//! slow-1 + signal-1.

use super::ema::{calculate_ema, ema_of};
use crate::domain::candle::Candle;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let n = candles.len();
    let undefined = MacdSeries {
        line: vec![None; n],
        signal: vec![None; n],
        histogram: vec![None; n],
    };
    if fast == 0 || slow == 0 || signal_period == 0 || fast >= slow || n < slow {
        return undefined;
    }

    let ema_fast = calculate_ema(candles, fast);
    let ema_slow = calculate_ema(candles, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // Signal EMA runs over the defined tail of the line only.
    let defined: Vec<f64> = line.iter().flatten().copied().collect();
    let offset = n - defined.len();
    let mut signal = vec![None; n];
    for (i, value) in ema_of(&defined, signal_period).into_iter().enumerate() {
        signal[offset + i] = value;
    }

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

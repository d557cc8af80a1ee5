//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the SMA of the first n values, then
//! EMA[i] = EMA[i-1] + k * (C[i] - EMA[i-1]).
//! Warmup: first (n-1) values are undefined.

use crate::domain::candle::Candle;

pub fn calculate_ema(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    ema_of(&closes, period)
}

/// EMA over a raw value slice. Shared with the MACD signal line.
pub fn ema_of(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for (i, &value) in values.iter().enumerate().skip(period) {
        ema += k * (value - ema);
        out[i] = Some(ema);
    }
    out
}

//! Average True Range.
//!
//! TR[0] = high - low, TR[i] = max(high-low, |high-prev_close|, |low-prev_close|).
//! Seed is the simple mean of the first n TRs, then Wilder smoothing:
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.
//! Warmup: first (n-1) values are undefined.

use crate::domain::candle::Candle;

pub fn calculate_atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; candles.len()];
    if period == 0 || candles.len() < period {
        return out;
    }

    let tr_values: Vec<f64> = candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i == 0 {
                c.range()
            } else {
                c.true_range(candles[i - 1].close)
            }
        })
        .collect();

    let mut atr = tr_values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(atr);

    for (i, &tr) in tr_values.iter().enumerate().skip(period) {
        atr = (atr * (period - 1) as f64 + tr) / period as f64;
        out[i] = Some(atr);
    }
    out
}

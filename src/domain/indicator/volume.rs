//! Trailing volume average.
//!
//! VOL_AVG[i] = mean(volume[i-n .. i]), the current bar excluded so a volume
//! spike is compared against what came before it.
//! Warmup: first n values are undefined.

use crate::domain::candle::Candle;

pub fn calculate_volume_avg(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; candles.len()];
    if period == 0 || candles.len() <= period {
        return out;
    }

    let mut sum: f64 = candles[..period].iter().map(|c| c.volume).sum();
    for i in period..candles.len() {
        out[i] = Some(sum / period as f64);
        sum += candles[i].volume - candles[i - period].volume;
    }
    out
}

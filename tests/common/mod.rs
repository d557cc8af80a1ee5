#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use tradesetup::domain::candle::Candle;
use tradesetup::domain::error::TradeSetupError;
use tradesetup::domain::indicator::IndicatorSeries;
use tradesetup::domain::scorer::SignalSource;
use tradesetup::domain::signal::Signal;
use tradesetup::ports::data_port::CandlePort;

/// 2024-01-01T00:00:00Z
pub const BASE_TS: i64 = 1_704_067_200;
pub const DAY: i64 = 86_400;

pub struct MockCandlePort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockCandlePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl CandlePort for MockCandlePort {
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, TradeSetupError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TradeSetupError::DataLoad {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradeSetupError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Signals keyed by candle index; everything else is WAIT.
pub struct ScriptedSource {
    pub signals: HashMap<usize, Signal>,
}

impl ScriptedSource {
    pub fn new(script: &[(usize, Signal)]) -> Self {
        Self {
            signals: script.iter().copied().collect(),
        }
    }
}

impl SignalSource for ScriptedSource {
    fn signal_at(&self, _candles: &[Candle], _series: &IndicatorSeries, index: usize) -> Signal {
        self.signals.get(&index).copied().unwrap_or(Signal::Wait)
    }
}

/// Builds candles one at a time with daily timestamps, each opening at the
/// previous close.
pub struct CandleBuilder {
    pub candles: Vec<Candle>,
    prev_close: f64,
}

impl CandleBuilder {
    pub fn new(start_price: f64) -> Self {
        Self {
            candles: Vec::new(),
            prev_close: start_price,
        }
    }

    pub fn last_close(&self) -> f64 {
        self.prev_close
    }

    /// Push a candle opening at the previous close. `shape` maps the open
    /// price to (high, low, close).
    pub fn push(&mut self, volume: f64, shape: impl Fn(f64) -> (f64, f64, f64)) -> &mut Self {
        let open = self.prev_close;
        let (high, low, close) = shape(open);
        self.candles.push(Candle {
            timestamp: BASE_TS + self.candles.len() as i64 * DAY,
            open,
            high,
            low,
            close,
            volume,
        });
        self.prev_close = close;
        self
    }

    /// Two-up-one-down drift with 0.1 wicks.
    pub fn zigzag(&mut self, count: usize, steps: [f64; 3], volume: impl Fn(usize) -> f64) -> &mut Self {
        for i in 0..count {
            let step = steps[i % 3];
            self.push(volume(i), |o| {
                let c = o + step;
                (o.max(c) + 0.1, o.min(c) - 0.1, c)
            });
        }
        self
    }

    /// `count` bars moving `step` each, with 0.1 wicks.
    pub fn drift(&mut self, count: usize, step: f64, volume: f64) -> &mut Self {
        for _ in 0..count {
            self.push(volume, |o| {
                let c = o + step;
                (o.max(c) + 0.1, o.min(c) - 0.1, c)
            });
        }
        self
    }

    /// One light-volume bar gapping `height` higher.
    pub fn gap_up(&mut self, height: f64) -> &mut Self {
        self.push(400.0, |o| (o + height + 0.1, o - 0.1, o + height))
    }

    /// A light-volume bar closing `depth` lower, below EMA20, then a hammer on
    /// heavy volume that reclaims it.
    pub fn dip_and_hammer(&mut self, depth: f64) -> &mut Self {
        self.push(600.0, |o| (o + 0.1, o - depth - 0.1, o - depth));
        self.push(3000.0, |o| (o + 0.12, o - 0.7, o + 0.1))
    }

    pub fn build(&self) -> Vec<Candle> {
        self.candles.clone()
    }
}

/// Steady uptrend, a three-bar pullback on rising volume, then a hammer.
///
/// The trend zigzags rather than rising every bar: strictly rising closes pin
/// RSI at 100, which earns no RSI credit (see `monotonic_uptrend_hammer`).
pub fn uptrend_pullback_hammer() -> Vec<Candle> {
    let mut b = CandleBuilder::new(100.0);
    b.zigzag(72, [0.6, 0.6, -0.4], |i| 1000.0 + 5.0 * i as f64);
    for _ in 0..3 {
        b.push(1400.0, |o| {
            let c = o - 0.5;
            (o + 0.1, c - 0.1, c)
        });
    }
    b.push(3000.0, |o| {
        let c = o + 0.1;
        (c + 0.02, o - 0.7, c)
    });
    b.build()
}

/// Mirror of `uptrend_pullback_hammer`: downtrend, rally, shooting star.
pub fn downtrend_rally_star() -> Vec<Candle> {
    let mut b = CandleBuilder::new(200.0);
    b.zigzag(72, [-0.6, -0.6, 0.4], |i| 1000.0 + 5.0 * i as f64);
    for _ in 0..3 {
        b.push(1400.0, |o| {
            let c = o + 0.5;
            (c + 0.1, o - 0.1, c)
        });
    }
    b.push(3000.0, |o| {
        let c = o - 0.1;
        (o + 0.7, c - 0.02, c)
    });
    b.build()
}

/// Closes rise 0.05 every bar on rising volume, ending in a hammer.
pub fn monotonic_uptrend_hammer() -> Vec<Candle> {
    let mut b = CandleBuilder::new(100.0);
    for i in 0..79 {
        b.push(1000.0 + 5.0 * i as f64, |o| {
            let c = o + 0.05;
            (c + 0.1, o - 0.1, c)
        });
    }
    b.push(3000.0, |o| (o + 0.06, o - 0.3, o + 0.05));
    b.build()
}

/// Closes alternate between 100.0 and 100.1.
pub fn sideways(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let (open, close) = if i % 2 == 0 { (100.1, 100.0) } else { (100.0, 100.1) };
            Candle {
                timestamp: BASE_TS + i as i64 * DAY,
                open,
                high: open.max(close) + 0.05,
                low: open.min(close) - 0.05,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Flat 1000 +/- 1 candles with 300-point spikes: up at 58, 68, 78 and
/// down at 88, 98.
pub fn flat_with_spikes() -> Vec<Candle> {
    (0..120)
        .map(|i| {
            let high = if matches!(i, 58 | 68 | 78) { 1300.0 } else { 1001.0 };
            let low = if matches!(i, 88 | 98) { 700.0 } else { 999.0 };
            Candle {
                timestamp: BASE_TS + i as i64 * DAY,
                open: 1000.0,
                high,
                low,
                close: 1000.0,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Three winning and two losing entries against `flat_with_spikes`.
pub fn three_wins_two_losses() -> ScriptedSource {
    ScriptedSource::new(&[
        (55, Signal::Call),
        (65, Signal::Put),
        (75, Signal::Call),
        (85, Signal::Call),
        (95, Signal::Put),
    ])
}

/// Repeating rallies, each followed by a three-bar pullback and a hammer. The
/// scorer enters on the first pullback bar and the rest of the pullback runs
/// into the stop, so every trade loses.
pub fn cyclic_setups(cycles: usize) -> Vec<Candle> {
    let mut b = CandleBuilder::new(100.0);
    for _ in 0..cycles {
        b.zigzag(24, [0.6, 0.6, -0.4], |_| 1000.0);
        for _ in 0..3 {
            b.push(1400.0, |o| {
                let c = o - 0.5;
                (o + 0.1, c - 0.1, c)
            });
        }
        b.push(3000.0, |o| {
            let c = o + 0.1;
            (c + 0.02, o - 0.7, c)
        });
    }
    b.build()
}

/// 120 daily candles in an uptrend with five dip-and-hammer entries for the
/// scorer. Their outcomes are TP2, STOP, TRAIL (rally past TP1, then give
/// back to the trailing stop), STOP and TP2.
pub fn trending_three_wins_two_losses() -> Vec<Candle> {
    let mut b = CandleBuilder::new(100.0);
    b.zigzag(50, [0.6, 0.6, -0.4], |_| 1000.0);
    b.dip_and_hammer(3.0).drift(4, 1.2, 800.0);
    b.dip_and_hammer(2.0).drift(4, -0.5, 800.0);
    b.dip_and_hammer(3.5).drift(3, 1.3, 800.0).drift(5, -0.8, 800.0);
    b.dip_and_hammer(2.0).drift(4, -0.5, 800.0);
    b.gap_up(5.0)
        .zigzag(5, [0.6, 0.6, -0.4], |_| 1000.0)
        .dip_and_hammer(2.0)
        .drift(5, 1.2, 800.0);
    b.zigzag(29, [0.6, 0.6, -0.4], |_| 1000.0);
    b.build()
}

pub fn write_candles_csv(dir: &Path, symbol: &str, candles: &[Candle]) {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for c in candles {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            c.timestamp, c.open, c.high, c.low, c.close, c.volume
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), out).unwrap();
}

//! CSV file candle adapter.
//!
//! One file per symbol, `<base>/<symbol>.csv`, with the header
//! `timestamp,open,high,low,close,volume`. Timestamps are epoch seconds or
//! `YYYY-MM-DD` dates taken as UTC midnight.

use crate::domain::candle::{validate_candles, Candle};
use crate::domain::error::TradeSetupError;
use crate::ports::data_port::CandlePort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }
}

fn load_err(reason: String) -> TradeSetupError {
    TradeSetupError::DataLoad { reason }
}

fn parse_timestamp(raw: &str, line: usize) -> Result<i64, TradeSetupError> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return Ok(secs);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| load_err(format!("line {line}: invalid timestamp '{raw}'")))
}

fn parse_field(record: &csv::StringRecord, idx: usize, name: &str, line: usize) -> Result<f64, TradeSetupError> {
    let raw = record
        .get(idx)
        .ok_or_else(|| load_err(format!("line {line}: missing {name} column")))?;
    raw.trim()
        .parse()
        .map_err(|e| load_err(format!("line {line}: invalid {name} value '{raw}': {e}")))
}

impl CandlePort for CsvAdapter {
    fn fetch_candles(&self, symbol: &str) -> Result<Vec<Candle>, TradeSetupError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path)
            .map_err(|e| load_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            // Header is line 1.
            let line = row + 2;
            let record = result.map_err(|e| load_err(format!("CSV parse error: {e}")))?;

            let timestamp = parse_timestamp(
                record
                    .get(0)
                    .ok_or_else(|| load_err(format!("line {line}: missing timestamp column")))?,
                line,
            )?;

            candles.push(Candle {
                timestamp,
                open: parse_field(&record, 1, "open", line)?,
                high: parse_field(&record, 2, "high", line)?,
                low: parse_field(&record, 3, "low", line)?,
                close: parse_field(&record, 4, "close", line)?,
                volume: parse_field(&record, 5, "volume", line)?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        validate_candles(&candles)?;
        tracing::debug!(symbol, candles = candles.len(), "loaded candles");
        Ok(candles)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradeSetupError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            load_err(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| load_err(format!("directory entry error: {e}")))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "timestamp,open,high,low,close,volume\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";
        fs::write(path.join("BTCUSD.csv"), csv_content).unwrap();

        let epoch_content = "timestamp,open,high,low,close,volume\n\
            1700000000,10.0,11.0,9.0,10.5,100.5\n\
            1700000060,10.5,11.5,10.0,11.0,0\n";
        fs::write(path.join("EURUSD.csv"), epoch_content).unwrap();
        fs::write(path.join("notes.txt"), "not candles").unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_candles_parses_and_sorts_dates() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let candles = adapter.fetch_candles("BTCUSD").unwrap();
        assert_eq!(candles.len(), 3);
        // 2024-01-15T00:00:00Z
        assert_eq!(candles[0].timestamp, 1_705_276_800);
        assert_eq!(candles[1].timestamp - candles[0].timestamp, 86_400);
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].high, 110.0);
        assert_eq!(candles[0].low, 90.0);
        assert_eq!(candles[0].close, 105.0);
        assert_eq!(candles[0].volume, 50_000.0);
    }

    #[test]
    fn fetch_candles_accepts_epoch_seconds() {
        let (_dir, path) = setup_test_data();
        let candles = CsvAdapter::new(path).fetch_candles("EURUSD").unwrap();
        assert_eq!(candles[0].timestamp, 1_700_000_000);
        assert_eq!(candles[0].volume, 100.5);
        assert_eq!(candles[1].volume, 0.0);
    }

    #[test]
    fn missing_file_is_data_load_error() {
        let (_dir, path) = setup_test_data();
        let err = CsvAdapter::new(path).fetch_candles("NOPE").unwrap_err();
        assert!(matches!(err, TradeSetupError::DataLoad { .. }));
    }

    #[test]
    fn bad_number_reports_line() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close,volume\n1,1.0,2.0,0.5,1.5,10\n2,abc,2.0,0.5,1.5,10\n",
        )
        .unwrap();
        let err = CsvAdapter::new(dir.path().to_path_buf())
            .fetch_candles("BAD")
            .unwrap_err();
        match err {
            TradeSetupError::DataLoad { reason } => assert!(reason.contains("line 3"), "{reason}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_timestamp_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD.csv"),
            "timestamp,open,high,low,close,volume\n15/01/2024,1.0,2.0,0.5,1.5,10\n",
        )
        .unwrap();
        let err = CsvAdapter::new(dir.path().to_path_buf())
            .fetch_candles("BAD")
            .unwrap_err();
        assert!(matches!(err, TradeSetupError::DataLoad { .. }));
    }

    #[test]
    fn duplicate_timestamps_fail_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("DUP.csv"),
            "timestamp,open,high,low,close,volume\n5,1.0,2.0,0.5,1.5,10\n5,1.0,2.0,0.5,1.5,10\n",
        )
        .unwrap();
        let err = CsvAdapter::new(dir.path().to_path_buf())
            .fetch_candles("DUP")
            .unwrap_err();
        assert!(matches!(err, TradeSetupError::InvalidCandle { index: 1, .. }));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let symbols = CsvAdapter::new(path).list_symbols().unwrap();
        assert_eq!(symbols, vec!["BTCUSD", "EURUSD"]);
    }

    #[test]
    fn list_symbols_missing_dir() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/candles"));
        assert!(matches!(
            adapter.list_symbols(),
            Err(TradeSetupError::DataLoad { .. })
        ));
    }
}

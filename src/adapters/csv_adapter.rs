//! CSV file market data adapter.
//!
//! Candle files carry `timestamp,open,high,low,close,volume` rows and
//! must be strictly ordered in time; tick files carry
//! `timestamp,bid,ask` rows and may repeat timestamps. Malformed rows
//! are reported with their 1-based row number, counting the header.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::error::SignalboxError;
use crate::domain::market::{Candle, Tick};
use crate::ports::data_port::MarketDataPort;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvMarketData {
    candle_path: PathBuf,
    tick_path: Option<PathBuf>,
}

impl CsvMarketData {
    pub fn new(candle_path: PathBuf, tick_path: Option<PathBuf>) -> Self {
        Self {
            candle_path,
            tick_path,
        }
    }
}

impl MarketDataPort for CsvMarketData {
    fn load_candles(&self) -> Result<Vec<Candle>, SignalboxError> {
        let candles = load_candles_from(&self.candle_path)?;
        debug!(
            path = %self.candle_path.display(),
            count = candles.len(),
            "candles loaded"
        );
        Ok(candles)
    }

    fn load_ticks(&self) -> Result<Vec<Tick>, SignalboxError> {
        let Some(path) = &self.tick_path else {
            return Ok(Vec::new());
        };
        let ticks = load_ticks_from(path)?;
        debug!(path = %path.display(), count = ticks.len(), "ticks loaded");
        Ok(ticks)
    }
}

pub fn load_candles_from(path: &Path) -> Result<Vec<Candle>, SignalboxError> {
    read_candles(&read_file(path)?)
}

pub fn load_ticks_from(path: &Path) -> Result<Vec<Tick>, SignalboxError> {
    read_ticks(&read_file(path)?)
}

/// Parses candle CSV content, enforcing strictly increasing timestamps
/// and that every bar's high/low bracket its open/close.
pub fn read_candles(content: &str) -> Result<Vec<Candle>, SignalboxError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut candles: Vec<Candle> = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let row = i + 2;
        let record = result.map_err(|e| market_error(format!("row {row}: {e}")))?;

        let timestamp = parse_timestamp(&record, row)?;
        let open: f64 = parse_field(&record, 1, "open", row)?;
        let high: f64 = parse_field(&record, 2, "high", row)?;
        let low: f64 = parse_field(&record, 3, "low", row)?;
        let close: f64 = parse_field(&record, 4, "close", row)?;
        let volume: f64 = parse_field(&record, 5, "volume", row)?;

        if low > open.min(close) || high < open.max(close) {
            return Err(market_error(format!(
                "row {row}: low and high do not bracket open and close"
            )));
        }
        if let Some(prev) = candles.last() {
            if timestamp <= prev.timestamp {
                return Err(market_error(format!(
                    "row {row}: candle timestamps must be strictly increasing"
                )));
            }
        }

        candles.push(Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(candles)
}

/// Parses tick CSV content. Timestamps may repeat but never go
/// backwards; bid and ask must be positive.
pub fn read_ticks(content: &str) -> Result<Vec<Tick>, SignalboxError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut ticks: Vec<Tick> = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let row = i + 2;
        let record = result.map_err(|e| market_error(format!("row {row}: {e}")))?;

        let timestamp = parse_timestamp(&record, row)?;
        let bid: f64 = parse_field(&record, 1, "bid", row)?;
        let ask: f64 = parse_field(&record, 2, "ask", row)?;

        if bid <= 0.0 || ask <= 0.0 {
            return Err(market_error(format!(
                "row {row}: bid and ask must be positive"
            )));
        }
        if let Some(prev) = ticks.last() {
            if timestamp < prev.timestamp {
                return Err(market_error(format!(
                    "row {row}: tick timestamps must not go backwards"
                )));
            }
        }

        ticks.push(Tick {
            timestamp,
            bid,
            ask,
        });
    }

    Ok(ticks)
}

fn market_error(reason: impl Into<String>) -> SignalboxError {
    SignalboxError::MarketData {
        reason: reason.into(),
    }
}

fn read_file(path: &Path) -> Result<String, SignalboxError> {
    fs::read_to_string(path)
        .map_err(|e| market_error(format!("failed to read {}: {}", path.display(), e)))
}

fn parse_timestamp(
    record: &csv::StringRecord,
    row: usize,
) -> Result<NaiveDateTime, SignalboxError> {
    let raw = record
        .get(0)
        .ok_or_else(|| market_error(format!("row {row}: missing timestamp column")))?;
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| market_error(format!("row {row}: invalid timestamp '{raw}': {e}")))
}

fn parse_field<T: FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<T, SignalboxError>
where
    T::Err: std::fmt::Display,
{
    let raw = record
        .get(index)
        .ok_or_else(|| market_error(format!("row {row}: missing {name} column")))?;
    raw.parse()
        .map_err(|e| market_error(format!("row {row}: invalid {name} value '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const CANDLES: &str = "timestamp,open,high,low,close,volume\n\
        2024-03-04 10:00:00,100.0,102.0,99.0,101.0,500\n\
        2024-03-04 10:01:00,101.0,103.0,100.0,102.0,600\n\
        2024-03-04 10:02:00,102.0,104.0,101.0,103.0,550\n";

    const TICKS: &str = "timestamp,bid,ask\n\
        2024-03-04 10:00:01,100.1,100.3\n\
        2024-03-04 10:00:02,100.2,100.4\n";

    fn setup_test_data() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let candle_path = dir.path().join("candles.csv");
        let tick_path = dir.path().join("ticks.csv");
        fs::write(&candle_path, CANDLES).unwrap();
        fs::write(&tick_path, TICKS).unwrap();
        (dir, candle_path, tick_path)
    }

    #[test]
    fn loads_candles_from_file() {
        let (_dir, candle_path, _) = setup_test_data();
        let adapter = CsvMarketData::new(candle_path, None);

        let candles = adapter.load_candles().unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(
            candles[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
        assert_eq!(candles[0].open, 100.0);
        assert_eq!(candles[0].high, 102.0);
        assert_eq!(candles[0].low, 99.0);
        assert_eq!(candles[0].close, 101.0);
        assert_eq!(candles[0].volume, 500.0);
    }

    #[test]
    fn loads_ticks_from_file() {
        let (_dir, candle_path, tick_path) = setup_test_data();
        let adapter = CsvMarketData::new(candle_path, Some(tick_path));

        let ticks = adapter.load_ticks().unwrap();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].bid, 100.1);
        assert_eq!(ticks[0].ask, 100.3);
    }

    #[test]
    fn no_tick_path_yields_empty_stream() {
        let (_dir, candle_path, _) = setup_test_data();
        let adapter = CsvMarketData::new(candle_path, None);
        assert!(adapter.load_ticks().unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_a_market_data_error() {
        let dir = TempDir::new().unwrap();
        let adapter = CsvMarketData::new(dir.path().join("absent.csv"), None);

        let err = adapter.load_candles().unwrap_err();
        assert!(matches!(err, SignalboxError::MarketData { .. }));
        assert!(err.to_string().contains("absent.csv"));
    }

    #[test]
    fn header_only_file_is_empty() {
        let candles = read_candles("timestamp,open,high,low,close,volume\n").unwrap();
        assert!(candles.is_empty());
    }

    #[test]
    fn rejects_out_of_order_candles() {
        let content = "timestamp,open,high,low,close,volume\n\
            2024-03-04 10:01:00,100.0,102.0,99.0,101.0,500\n\
            2024-03-04 10:01:00,101.0,103.0,100.0,102.0,600\n";
        let err = read_candles(content).unwrap_err();
        assert!(err.to_string().contains("row 3"));
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_unbracketed_ohlc() {
        let content = "timestamp,open,high,low,close,volume\n\
            2024-03-04 10:00:00,100.0,100.5,99.0,101.0,500\n";
        let err = read_candles(content).unwrap_err();
        assert!(err.to_string().contains("row 2"));
        assert!(err.to_string().contains("bracket"));
    }

    #[test]
    fn rejects_bad_timestamp() {
        let content = "timestamp,open,high,low,close,volume\n\
            04/03/2024 10:00,100.0,102.0,99.0,101.0,500\n";
        let err = read_candles(content).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn rejects_non_numeric_field() {
        let content = "timestamp,open,high,low,close,volume\n\
            2024-03-04 10:00:00,100.0,102.0,99.0,n/a,500\n";
        let err = read_candles(content).unwrap_err();
        assert!(err.to_string().contains("invalid close value 'n/a'"));
    }

    #[test]
    fn rejects_non_positive_tick_prices() {
        let content = "timestamp,bid,ask\n\
            2024-03-04 10:00:01,0.0,100.3\n";
        let err = read_ticks(content).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn tick_timestamps_may_repeat_but_not_reverse() {
        let repeated = "timestamp,bid,ask\n\
            2024-03-04 10:00:01,100.1,100.3\n\
            2024-03-04 10:00:01,100.2,100.4\n";
        assert_eq!(read_ticks(repeated).unwrap().len(), 2);

        let reversed = "timestamp,bid,ask\n\
            2024-03-04 10:00:02,100.1,100.3\n\
            2024-03-04 10:00:01,100.2,100.4\n";
        let err = read_ticks(reversed).unwrap_err();
        assert!(err.to_string().contains("row 3"));
        assert!(err.to_string().contains("not go backwards"));
    }
}

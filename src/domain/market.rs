//! Market data primitives: OHLCV candles and bid/ask ticks.

use chrono::NaiveDateTime;
use serde::Serialize;

/// One OHLCV aggregate over a fixed time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One bid/ask quote update.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub timestamp: NaiveDateTime,
    pub bid: f64,
    pub ask: f64,
}

impl Tick {
    /// ask - bid
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

/// Which price of a candle a time-based strategy references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl PriceField {
    pub fn value(&self, candle: &Candle) -> f64 {
        match self {
            PriceField::Open => candle.open,
            PriceField::High => candle.high,
            PriceField::Low => candle.low,
            PriceField::Close => candle.close,
        }
    }

    /// Parse a document-format price name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "open" => Some(PriceField::Open),
            "high" => Some(PriceField::High),
            "low" => Some(PriceField::Low),
            "close" => Some(PriceField::Close),
            _ => None,
        }
    }
}

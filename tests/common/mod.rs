#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use signalbox::domain::document::StrategyDocument;
use signalbox::domain::error::SignalboxError;
use signalbox::domain::market::{Candle, Tick};
use signalbox::domain::schema;
use signalbox::domain::strategy::StrategyDefinition;
use signalbox::ports::data_port::MarketDataPort;

pub struct MockMarketData {
    pub candles: Vec<Candle>,
    pub ticks: Vec<Tick>,
    pub candle_error: Option<String>,
    pub tick_error: Option<String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            candles: Vec::new(),
            ticks: Vec::new(),
            candle_error: None,
            tick_error: None,
        }
    }

    pub fn with_candles(mut self, candles: Vec<Candle>) -> Self {
        self.candles = candles;
        self
    }

    pub fn with_ticks(mut self, ticks: Vec<Tick>) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn with_candle_error(mut self, reason: &str) -> Self {
        self.candle_error = Some(reason.to_string());
        self
    }

    pub fn with_tick_error(mut self, reason: &str) -> Self {
        self.tick_error = Some(reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn load_candles(&self) -> Result<Vec<Candle>, SignalboxError> {
        if let Some(reason) = &self.candle_error {
            return Err(SignalboxError::MarketData {
                reason: reason.clone(),
            });
        }
        Ok(self.candles.clone())
    }

    fn load_ticks(&self) -> Result<Vec<Tick>, SignalboxError> {
        if let Some(reason) = &self.tick_error {
            return Err(SignalboxError::MarketData {
                reason: reason.clone(),
            });
        }
        Ok(self.ticks.clone())
    }
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_candle(timestamp: &str, close: f64) -> Candle {
    Candle {
        timestamp: ts(timestamp),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume: 1000.0,
    }
}

pub fn make_ohlc(timestamp: &str, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp: ts(timestamp),
        open,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

pub fn make_tick(timestamp: &str, bid: f64, ask: f64) -> Tick {
    Tick {
        timestamp: ts(timestamp),
        bid,
        ask,
    }
}

/// One candle per minute with closes stepping linearly from
/// `start_price`.
pub fn generate_candles(start: &str, count: usize, start_price: f64, step: f64) -> Vec<Candle> {
    let start_ts = ts(start);
    (0..count)
        .map(|i| {
            let close = start_price + step * i as f64;
            Candle {
                timestamp: start_ts + chrono::Duration::minutes(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

pub fn definition_from(json: &str) -> StrategyDefinition {
    let document: StrategyDocument = serde_json::from_str(json).unwrap();
    schema::validate(&document).unwrap()
}

pub const TIME_BASED_STRATEGY: &str = r#"{
    "name": "morning_breakout",
    "version": "1.0.0",
    "description": "Trade the 10:00 close against the 09:30 close",
    "timing": {
        "reference_time": "09:30",
        "reference_price": "close",
        "signal_time": "10:00"
    },
    "conditions": {
        "buy": { "compare": "signal_price > reference_price" },
        "sell": { "compare": "signal_price < reference_price" }
    },
    "risk_management": {
        "stop_loss_pips": 10,
        "take_profit_pips": 20,
        "max_daily_trades": 1
    }
}"#;

pub const RSI_CROSSOVER_STRATEGY: &str = r#"{
    "name": "rsi_reversal",
    "version": "1.2.0",
    "description": "Fade RSI extremes on the transition candle",
    "indicators": [
        { "type": "rsi", "alias": "rsi_14", "period": 14 }
    ],
    "conditions": {
        "buy": { "compare": "rsi_14 < 30", "crossover": true },
        "sell": { "compare": "rsi_14 > 70", "crossover": true }
    },
    "risk_management": {
        "stop_loss_pips": 15,
        "take_profit_pips": 30,
        "max_daily_trades": 3
    }
}"#;

pub const STOCHASTIC_ROTATION_STRATEGY: &str = r#"{
    "name": "stoch_rotation",
    "version": "2.0.1",
    "description": "Enter when both stochastics rotate out of an extreme zone",
    "indicators": [
        { "type": "stochastic", "alias": "fast", "k_period": 5, "k_smoothing": 1, "d_smoothing": 1 },
        { "type": "stochastic", "alias": "slow", "k_period": 8, "k_smoothing": 1, "d_smoothing": 1 }
    ],
    "conditions": {
        "buy": {
            "type": "rotation",
            "zone": { "all_below": 25, "indicators": ["fast", "slow"] },
            "trigger": { "indicator": "fast", "crosses_above": 25 }
        },
        "sell": {
            "type": "rotation",
            "zone": { "all_above": 75, "indicators": ["fast", "slow"] },
            "trigger": { "indicator": "fast", "crosses_below": 75 }
        }
    },
    "risk_management": {
        "stop_loss_pips": 10,
        "take_profit_pips": 20,
        "max_daily_trades": 2
    }
}"#;

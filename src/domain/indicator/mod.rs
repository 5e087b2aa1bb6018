//! Technical indicator calculations and snapshot plumbing.
//!
//! Types in this module:
//! - `IndicatorKind`: indicator identity plus parameters
//! - `IndicatorPoint`: one point in an indicator time series
//! - `IndicatorValue`: the different output shapes (single line, MACD triple, %K/%D pair)
//! - `IndicatorSeries`: a full series aligned with the input candles
//! - `IndicatorSnapshot`: the latest values flattened under their aliases

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use ema::calculate_ema;
pub use macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW, calculate_macd};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::{
    DEFAULT_D_SMOOTHING, DEFAULT_K_PERIOD, DEFAULT_K_SMOOTHING, calculate_stochastic,
};

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::market::Candle;

/// Indicator identity plus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma {
        period: usize,
    },
    Ema {
        period: usize,
    },
    Rsi {
        period: usize,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        k_smoothing: usize,
        d_smoothing: usize,
    },
}

impl IndicatorKind {
    /// Snapshot keys an indicator of this kind publishes under `alias`.
    ///
    /// Multi-output indicators derive extra keys from the alias: MACD adds
    /// `<alias>_signal` and `<alias>_histogram`, Stochastic adds `<alias>_d`.
    pub fn snapshot_keys(&self, alias: &str) -> Vec<String> {
        match self {
            IndicatorKind::Macd { .. } => vec![
                alias.to_string(),
                format!("{alias}_signal"),
                format!("{alias}_histogram"),
            ],
            IndicatorKind::Stochastic { .. } => vec![alias.to_string(), format!("{alias}_d")],
            _ => vec![alias.to_string()],
        }
    }

    /// Candles needed before the newest point of the series is defined.
    ///
    /// SMA and EMA seed over one full window, RSI needs `period` price
    /// changes, and the layered indicators chain their stages: each
    /// smoothing pass starts only once its input is defined.
    pub fn min_history(&self) -> usize {
        match *self {
            IndicatorKind::Sma { period } | IndicatorKind::Ema { period } => period,
            IndicatorKind::Rsi { period } => period + 1,
            IndicatorKind::Macd { fast, slow, signal } => fast.max(slow) + signal - 1,
            IndicatorKind::Stochastic {
                k_period,
                k_smoothing,
                d_smoothing,
            } => k_period + k_smoothing + d_smoothing - 2,
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma { period } => write!(f, "SMA({period})"),
            IndicatorKind::Ema { period } => write!(f, "EMA({period})"),
            IndicatorKind::Rsi { period } => write!(f, "RSI({period})"),
            IndicatorKind::Macd { fast, slow, signal } => {
                write!(f, "MACD({fast},{slow},{signal})")
            }
            IndicatorKind::Stochastic {
                k_period,
                k_smoothing,
                d_smoothing,
            } => write!(f, "STOCHASTIC({k_period},{k_smoothing},{d_smoothing})"),
        }
    }
}

/// One configured indicator: what to compute and the alias conditions use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSpec {
    pub kind: IndicatorKind,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub kind: IndicatorKind,
    pub values: Vec<IndicatorPoint>,
}

/// Latest indicator values flattened under their aliases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub values: HashMap<String, f64>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn get(&self, alias: &str) -> Option<f64> {
        self.values.get(alias).copied()
    }
}

/// Computes the full series for one indicator kind.
pub fn compute_series(candles: &[Candle], kind: &IndicatorKind) -> IndicatorSeries {
    match *kind {
        IndicatorKind::Sma { period } => calculate_sma(candles, period),
        IndicatorKind::Ema { period } => calculate_ema(candles, period),
        IndicatorKind::Rsi { period } => calculate_rsi(candles, period),
        IndicatorKind::Macd { fast, slow, signal } => calculate_macd(candles, fast, slow, signal),
        IndicatorKind::Stochastic {
            k_period,
            k_smoothing,
            d_smoothing,
        } => calculate_stochastic(candles, k_period, k_smoothing, d_smoothing),
    }
}

/// Computes the latest value of every configured indicator and exposes the
/// results under the aliases condition expressions refer to.
///
/// Indicators still warming up are absent from the snapshot entirely, so
/// evaluation sees an unbound variable instead of a placeholder zero.
pub fn compute_snapshot(candles: &[Candle], specs: &[IndicatorSpec]) -> IndicatorSnapshot {
    let mut snapshot = IndicatorSnapshot::new();
    for spec in specs {
        let series = compute_series(candles, &spec.kind);
        let Some(point) = series.values.last() else {
            continue;
        };
        if !point.valid {
            continue;
        }
        match point.value {
            IndicatorValue::Simple(value) => {
                snapshot.values.insert(spec.alias.clone(), value);
            }
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => {
                snapshot.values.insert(spec.alias.clone(), line);
                snapshot
                    .values
                    .insert(format!("{}_signal", spec.alias), signal);
                snapshot
                    .values
                    .insert(format!("{}_histogram", spec.alias), histogram);
            }
            IndicatorValue::Stochastic { k, d } => {
                snapshot.values.insert(spec.alias.clone(), k);
                snapshot.values.insert(format!("{}_d", spec.alias), d);
            }
        }
    }
    snapshot
}

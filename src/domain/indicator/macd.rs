//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! Line = EMA(fast) - EMA(slow), signal = EMA(signal) of the line seeded
//! with a mean of its first `signal` defined values, histogram = line -
//! signal. A point is valid once the signal line is defined, so the
//! warmup is the slower EMA window plus the signal window.
//!
//! Default parameters: fast=12, slow=26, signal=9

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::market::Candle;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let kind = IndicatorKind::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if candles.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            kind,
            values: Vec::new(),
        };
    }

    let closes: Vec<Option<f64>> = candles.iter().map(|c| Some(c.close)).collect();
    let fast_line = ema_over(&closes, fast);
    let slow_line = ema_over(&closes, slow);

    let macd_line: Vec<Option<f64>> = fast_line
        .iter()
        .zip(&slow_line)
        .map(|pair| match pair {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();
    let signal_line = ema_over(&macd_line, signal_period);

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let line = macd_line[i].unwrap_or(0.0);
            let signal = signal_line[i].unwrap_or(0.0);
            IndicatorPoint {
                timestamp: candle.timestamp,
                valid: signal_line[i].is_some(),
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                },
            }
        })
        .collect();

    IndicatorSeries { kind, values }
}

/// EMA over an optional series. Undefined inputs are skipped, the seed is
/// the mean of the first `period` defined values, and the recursion runs
/// from there with weight 2/(period+1).
fn ema_over(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let weight = 2.0 / (period as f64 + 1.0);
    let mut out = vec![None; values.len()];
    let mut state: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seeded = 0usize;

    for (i, value) in values.iter().enumerate() {
        let Some(value) = value else { continue };
        state = match state {
            Some(prev) => Some(value * weight + prev * (1.0 - weight)),
            None => {
                seed_sum += value;
                seeded += 1;
                (seeded == period).then(|| seed_sum / period as f64)
            }
        };
        out[i] = state;
    }
    out
}

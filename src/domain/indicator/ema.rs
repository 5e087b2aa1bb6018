//! Exponential Moving Average indicator.
//!
//! Smoothing weight 2/(n+1). The first value is the mean of the first n
//! closes, every later value is `close * w + previous * (1 - w)`. Points
//! inside the seed window are invalid.

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::market::Candle;

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Ema { period };
    if period == 0 || candles.is_empty() {
        return IndicatorSeries {
            kind,
            values: Vec::new(),
        };
    }

    let weight = 2.0 / (period as f64 + 1.0);
    let mut state: Option<f64> = None;
    let mut seed_sum = 0.0;

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            state = match state {
                Some(prev) => Some(candle.close * weight + prev * (1.0 - weight)),
                None => {
                    seed_sum += candle.close;
                    (i + 1 == period).then(|| seed_sum / period as f64)
                }
            };
            IndicatorPoint {
                timestamp: candle.timestamp,
                valid: state.is_some(),
                value: IndicatorValue::Simple(state.unwrap_or(0.0)),
            }
        })
        .collect();

    IndicatorSeries { kind, values }
}

//! RSI (Relative Strength Index) indicator.
//!
//! RSI = 100 - 100/(1 + avg_gain/avg_loss), with Wilder smoothing: the
//! first averages are plain means over the first n close-to-close
//! changes, after that `avg = (avg * (n-1) + change) / n`. An all-gain
//! window (avg_loss == 0) reads as 100. The first n candles are invalid
//! because n changes are needed to seed the averages.

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::market::Candle;

pub fn calculate_rsi(candles: &[Candle], period: usize) -> IndicatorSeries {
    let kind = IndicatorKind::Rsi { period };
    if period == 0 || candles.len() < 2 {
        let values = candles.iter().map(warming_up).collect();
        return IndicatorSeries { kind, values };
    }

    let mut values = Vec::with_capacity(candles.len());
    values.push(warming_up(&candles[0]));

    let n = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut changes_seen = 0usize;

    for pair in candles.windows(2) {
        let change = pair[1].close - pair[0].close;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if changes_seen < period {
            avg_gain += gain;
            avg_loss += loss;
            changes_seen += 1;
            if changes_seen < period {
                values.push(warming_up(&pair[1]));
                continue;
            }
            avg_gain /= n;
            avg_loss /= n;
        } else {
            avg_gain = (avg_gain * (n - 1.0) + gain) / n;
            avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        }

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        values.push(IndicatorPoint {
            timestamp: pair[1].timestamp,
            valid: true,
            value: IndicatorValue::Simple(rsi),
        });
    }

    IndicatorSeries { kind, values }
}

fn warming_up(candle: &Candle) -> IndicatorPoint {
    IndicatorPoint {
        timestamp: candle.timestamp,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    }
}

//! Stochastic oscillator.
//!
//! Raw %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over
//! `k_period` candles. %K is that raw value smoothed with an SMA of
//! `k_smoothing`, %D is an SMA of %K over `d_smoothing`.
//!
//! Default parameters: k_period=14, k_smoothing=3, d_smoothing=3
//! Warmup: k_period + k_smoothing + d_smoothing - 3 candles. A point is
//! valid once %D is defined.

use crate::domain::indicator::{IndicatorKind, IndicatorPoint, IndicatorSeries, IndicatorValue};
use crate::domain::market::Candle;

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_K_SMOOTHING: usize = 3;
pub const DEFAULT_D_SMOOTHING: usize = 3;

/// Floor for the high-low range so a flat window cannot divide by zero.
const MIN_RANGE: f64 = 1e-9;

pub fn calculate_stochastic(
    candles: &[Candle],
    k_period: usize,
    k_smoothing: usize,
    d_smoothing: usize,
) -> IndicatorSeries {
    let kind = IndicatorKind::Stochastic {
        k_period,
        k_smoothing,
        d_smoothing,
    };

    if candles.is_empty() || k_period == 0 || k_smoothing == 0 || d_smoothing == 0 {
        return IndicatorSeries {
            kind,
            values: Vec::new(),
        };
    }

    let mut raw_k: Vec<Option<f64>> = vec![None; candles.len()];
    for i in (k_period - 1)..candles.len() {
        let window = &candles[i + 1 - k_period..=i];
        let lowest_low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let highest_high = window
            .iter()
            .map(|c| c.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let range = (highest_high - lowest_low).max(MIN_RANGE);
        raw_k[i] = Some(100.0 * (candles[i].close - lowest_low) / range);
    }

    let percent_k = sma_over(&raw_k, k_smoothing);
    let percent_d = sma_over(&percent_k, d_smoothing);

    let mut values = Vec::with_capacity(candles.len());
    for (i, candle) in candles.iter().enumerate() {
        values.push(IndicatorPoint {
            timestamp: candle.timestamp,
            valid: percent_d[i].is_some(),
            value: IndicatorValue::Stochastic {
                k: percent_k[i].unwrap_or(0.0),
                d: percent_d[i].unwrap_or(0.0),
            },
        });
    }

    IndicatorSeries { kind, values }
}

/// SMA over an optional series, defined where the whole window is defined.
fn sma_over(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for i in 0..values.len() {
        if i + 1 < period {
            continue;
        }
        let window = &values[i + 1 - period..=i];
        let mut sum = 0.0;
        let mut defined = 0;
        for value in window.iter().flatten() {
            sum += *value;
            defined += 1;
        }
        if defined == period {
            out[i] = Some(sum / period as f64);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_candle(minute: u32, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
                + chrono::Duration::minutes(minute as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000.0,
        }
    }

    fn stochastic_value(point: &IndicatorPoint) -> (f64, f64) {
        match point.value {
            IndicatorValue::Stochastic { k, d } => (k, d),
            _ => panic!("expected Stochastic value"),
        }
    }

    #[test]
    fn stochastic_warmup_default() {
        let candles: Vec<Candle> = (0..25)
            .map(|i| {
                let base = 100.0 + (i as f64 % 6.0);
                make_candle(i, base + 1.0, base - 1.0, base)
            })
            .collect();

        let series = calculate_stochastic(
            &candles,
            DEFAULT_K_PERIOD,
            DEFAULT_K_SMOOTHING,
            DEFAULT_D_SMOOTHING,
        );

        let warmup = DEFAULT_K_PERIOD + DEFAULT_K_SMOOTHING + DEFAULT_D_SMOOTHING - 3;
        for i in 0..warmup {
            assert!(!series.values[i].valid, "index {} should not be valid", i);
        }
        assert!(series.values[warmup].valid);
    }

    #[test]
    fn stochastic_known_raw_k() {
        // No smoothing: %K is the raw value and %D equals %K.
        let candles = vec![
            make_candle(0, 10.0, 8.0, 9.0),
            make_candle(1, 11.0, 9.0, 10.0),
            make_candle(2, 12.0, 10.0, 11.0),
        ];

        let series = calculate_stochastic(&candles, 3, 1, 1);

        assert!(series.values[2].valid);
        let (k, d) = stochastic_value(&series.values[2]);
        // lowest low 8, highest high 12, close 11 -> 100 * 3 / 4
        assert!((k - 75.0).abs() < 1e-9);
        assert!((d - 75.0).abs() < 1e-9);
    }

    #[test]
    fn stochastic_close_at_extremes() {
        let at_high = vec![
            make_candle(0, 10.0, 8.0, 9.0),
            make_candle(1, 11.0, 9.0, 10.0),
            make_candle(2, 12.0, 10.0, 12.0),
        ];
        let series = calculate_stochastic(&at_high, 3, 1, 1);
        let (k, _) = stochastic_value(&series.values[2]);
        assert!((k - 100.0).abs() < 1e-9);

        let at_low = vec![
            make_candle(0, 10.0, 8.0, 9.0),
            make_candle(1, 11.0, 9.0, 10.0),
            make_candle(2, 12.0, 8.0, 8.0),
        ];
        let series = calculate_stochastic(&at_low, 3, 1, 1);
        let (k, _) = stochastic_value(&series.values[2]);
        assert!(k.abs() < 1e-9);
    }

    #[test]
    fn stochastic_flat_window_is_finite() {
        let candles: Vec<Candle> = (0..5).map(|i| make_candle(i, 100.0, 100.0, 100.0)).collect();

        let series = calculate_stochastic(&candles, 3, 1, 1);

        for point in &series.values {
            let (k, d) = stochastic_value(point);
            assert!(k.is_finite());
            assert!(d.is_finite());
        }
        let (k, _) = stochastic_value(&series.values[4]);
        assert_eq!(k, 0.0);
    }

    #[test]
    fn stochastic_d_is_sma_of_k() {
        let candles: Vec<Candle> = (0..10)
            .map(|i| {
                let base = 100.0 + (i as f64 % 4.0) * 2.0;
                make_candle(i, base + 1.5, base - 1.5, base)
            })
            .collect();

        let series = calculate_stochastic(&candles, 3, 1, 2);

        for i in 3..10 {
            let (k_cur, d) = stochastic_value(&series.values[i]);
            let (k_prev, _) = stochastic_value(&series.values[i - 1]);
            if series.values[i].valid && series.values[i - 1].valid {
                assert!(
                    (d - (k_cur + k_prev) / 2.0).abs() < 1e-9,
                    "%D mismatch at index {}",
                    i
                );
            }
        }
    }

    #[test]
    fn stochastic_values_in_range() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let base = 100.0 + ((i * 7) % 11) as f64;
                make_candle(i, base + 2.0, base - 2.0, base + 1.0)
            })
            .collect();

        let series = calculate_stochastic(
            &candles,
            DEFAULT_K_PERIOD,
            DEFAULT_K_SMOOTHING,
            DEFAULT_D_SMOOTHING,
        );

        for point in &series.values {
            if point.valid {
                let (k, d) = stochastic_value(point);
                assert!((0.0..=100.0).contains(&k), "%K {} out of range", k);
                assert!((0.0..=100.0).contains(&d), "%D {} out of range", d);
            }
        }
    }

    #[test]
    fn stochastic_empty_candles() {
        let series = calculate_stochastic(&[], 14, 3, 3);
        assert!(series.values.is_empty());
    }

    #[test]
    fn stochastic_zero_parameters() {
        let candles = vec![make_candle(0, 10.0, 8.0, 9.0)];
        assert!(calculate_stochastic(&candles, 0, 3, 3).values.is_empty());
        assert!(calculate_stochastic(&candles, 14, 0, 3).values.is_empty());
        assert!(calculate_stochastic(&candles, 14, 3, 0).values.is_empty());
    }

    #[test]
    fn stochastic_kind() {
        let candles = vec![make_candle(0, 10.0, 8.0, 9.0)];
        let series = calculate_stochastic(&candles, 14, 3, 3);
        assert_eq!(
            series.kind,
            IndicatorKind::Stochastic {
                k_period: 14,
                k_smoothing: 3,
                d_smoothing: 3
            }
        );
    }
}

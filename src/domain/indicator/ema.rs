//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! The recursion runs from the first bar; the first (n-1) values are reported
//! as warm-up.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub fn calculate_ema(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(period),
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let raw = ema_of(&closes, period);

    let values = bars
        .iter()
        .zip(raw)
        .map(|(bar, value)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: value.is_some(),
            value: IndicatorValue::Simple(value.unwrap_or(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// Recursive EMA over an arbitrary sequence, seeded with its first sample.
/// `None` for the first `period - 1` samples.
pub(crate) fn ema_of(input: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; input.len()];
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    smooth(input, alpha, period)
}

/// Exponential smoothing `s[i] = a*x[i] + (1-a)*s[i-1]` with `s[0] = x[0]`,
/// hiding the first `min_periods - 1` values.
pub(crate) fn smooth(input: &[f64], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    input
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let s = match state {
                None => x,
                Some(prev) => alpha * x + (1.0 - alpha) * prev,
            };
            state = Some(s);
            (i + 1 >= min_periods).then_some(s)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn ema_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn ema_period_1() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 1);

        assert_eq!(series.simple_at(0), Some(10.0));
        assert_eq!(series.simple_at(1), Some(20.0));
    }

    #[test]
    fn ema_is_seeded_with_first_close() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 3);

        // 10 -> 15 -> 22.5 with k = 0.5
        assert!((series.simple_at(2).unwrap() - 22.5).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_ema(&bars, 3);

        let k = 2.0 / 4.0;
        let mut ema = 10.0;
        for (i, close) in [20.0, 30.0, 40.0, 50.0].into_iter().enumerate() {
            ema = close * k + ema * (1.0 - k);
            if i + 1 >= 2 {
                assert!((series.simple_at(i + 1).unwrap() - ema).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn smoothing_warmup_hides_early_values() {
        let out = smooth(&[1.0, 2.0, 3.0], 0.5, 2);
        assert_eq!(out, vec![None, Some(1.5), Some(2.25)]);
    }

    #[test]
    fn ema_equal_prices() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0, 100.0]);
        let series = calculate_ema(&bars, 3);

        for i in 2..5 {
            assert!((series.simple_at(i).unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_empty_bars() {
        let series = calculate_ema(&[], 3);
        assert!(series.values.is_empty());
    }

    #[test]
    fn ema_period_0() {
        let bars = make_bars(&[10.0, 20.0]);
        let series = calculate_ema(&bars, 0);
        assert!(series.values.is_empty());
    }
}

//! Average True Range indicator.
//!
//! TR[0] = high - low, TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! Seed with the mean of the first n true ranges, then Wilder smoothing:
//! ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n. Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    if bars.len() < period || period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values: vec![],
        };
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.range()
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut results: Vec<IndicatorPoint> = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let valid = i + 1 >= period;
        if i + 1 == period {
            atr = tr_values[..period].iter().sum::<f64>() / period as f64;
        } else if valid {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
        }
        results.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Simple(if valid { atr } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}

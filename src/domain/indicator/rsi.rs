//! RSI (Relative Strength Index) indicator.
//!
//! Gains and losses are close-to-close changes, with the first bar counted as
//! no change. Both are smoothed with alpha = 1/n starting from the first bar:
//! avg[i] = avg[i-1] + (x[i] - avg[i-1]) / n.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::ema::smooth;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::Bar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars
                .iter()
                .map(|bar| IndicatorPoint {
                    timestamp: bar.timestamp,
                    valid: false,
                    value: IndicatorValue::Simple(0.0),
                })
                .collect(),
        };
    }

    let changes: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| if i == 0 { 0.0 } else { bar.close - bars[i - 1].close })
        .collect();
    let gains: Vec<f64> = changes.iter().map(|c| c.max(0.0)).collect();
    let losses: Vec<f64> = changes.iter().map(|c| (-c).max(0.0)).collect();

    let alpha = 1.0 / period as f64;
    let avg_gain = smooth(&gains, alpha, period);
    let avg_loss = smooth(&losses, alpha, period);

    let values = bars
        .iter()
        .zip(avg_gain.into_iter().zip(avg_loss))
        .map(|(bar, averages)| {
            let rsi = match averages {
                (Some(_), Some(loss)) if loss == 0.0 => Some(100.0),
                (Some(gain), Some(loss)) => Some(100.0 - (100.0 / (1.0 + gain / loss))),
                _ => None,
            };
            IndicatorPoint {
                timestamp: bar.timestamp,
                valid: rsi.is_some(),
                value: IndicatorValue::Simple(rsi.unwrap_or(0.0)),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

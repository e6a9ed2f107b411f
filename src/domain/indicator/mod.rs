//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Warm-up points carry `valid: false`. The accessors on `IndicatorSeries`
//! return `None` for them, so callers treat warm-up as "no signal".

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::{calculate_macd, calculate_macd_default};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdReading {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn valid_point(&self, index: usize) -> Option<&IndicatorPoint> {
        self.values.get(index).filter(|p| p.valid)
    }

    /// Scalar value at `index`, `None` during warm-up or out of range.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.valid_point(index)?.value {
            IndicatorValue::Simple(v) if v.is_finite() => Some(v),
            _ => None,
        }
    }

    pub fn macd_at(&self, index: usize) -> Option<MacdReading> {
        match self.valid_point(index)?.value {
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => Some(MacdReading {
                line,
                signal,
                histogram,
            }),
            _ => None,
        }
    }

    pub fn bollinger_at(&self, index: usize) -> Option<BandReading> {
        match self.valid_point(index)?.value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => Some(BandReading {
                upper,
                middle,
                lower,
            }),
            _ => None,
        }
    }

    /// Most recent valid scalar value, skipping trailing warm-up points.
    pub fn last_valid_simple(&self) -> Option<f64> {
        (0..self.values.len()).rev().find_map(|i| self.simple_at(i))
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::make_bars;
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2)");
    }

    #[test]
    fn accessors_hide_warmup_points() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0]);
        let series = calculate_sma(&bars, 3);

        assert_eq!(series.simple_at(0), None);
        assert_eq!(series.simple_at(1), None);
        assert_eq!(series.simple_at(2), Some(20.0));
        assert_eq!(series.simple_at(99), None);
        assert_eq!(series.last_valid_simple(), Some(30.0));
        assert_eq!(series.macd_at(3), None);
    }

    #[test]
    fn last_valid_simple_on_empty_series() {
        let series = calculate_sma(&[], 3);
        assert!(series.is_empty());
        assert_eq!(series.last_valid_simple(), None);
    }
}

//! OHLCV bar representation and series-level checks.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::TrendscopeError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Reject series the analysis components cannot reason about: timestamps that
/// do not strictly increase, and prices that are non-finite or non-positive.
pub fn validate_series(bars: &[Bar]) -> Result<(), TrendscopeError> {
    for (i, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(TrendscopeError::MalformedSeries {
                index: i,
                reason: "prices must be finite and positive".into(),
            });
        }
        if !bar.volume.is_finite() || bar.volume < 0.0 {
            return Err(TrendscopeError::MalformedSeries {
                index: i,
                reason: "volume must be finite and non-negative".into(),
            });
        }
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(TrendscopeError::MalformedSeries {
                index: i,
                reason: format!(
                    "timestamp {} does not follow {}",
                    bar.timestamp,
                    bars[i - 1].timestamp
                ),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    Unknown,
}

impl Timeframe {
    /// Infer the bar interval from the spacing of the first two bars.
    pub fn infer(bars: &[Bar]) -> Self {
        if bars.len() < 2 {
            return Timeframe::Unknown;
        }
        let delta = (bars[1].timestamp - bars[0].timestamp).num_seconds();
        match delta {
            d if d <= 60 => Timeframe::M1,
            d if d <= 300 => Timeframe::M5,
            d if d <= 900 => Timeframe::M15,
            d if d <= 1800 => Timeframe::M30,
            d if d <= 3600 => Timeframe::H1,
            d if d <= 14_400 => Timeframe::H4,
            d if d <= 86_400 => Timeframe::D1,
            _ => Timeframe::Unknown,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
            Timeframe::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Timeframe {
    type Err = TrendscopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            other => Err(TrendscopeError::InvalidTimeframe {
                name: other.to_string(),
            }),
        }
    }
}

/// Round to a fixed number of decimal places.
pub fn round_dp(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sample_bar() -> Bar {
        Bar {
            timestamp: ts(10, 0),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn true_range_hl_dominates() {
        let bar = sample_bar();
        assert!((bar.true_range(100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let bar = sample_bar();
        // high-low=20, |110-70|=40, |90-70|=20 → 40
        assert!((bar.true_range(70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        let bar = sample_bar();
        assert!((bar.true_range(130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn candle_polarity() {
        let mut bar = sample_bar();
        assert!(bar.is_bullish());
        bar.close = 95.0;
        assert!(!bar.is_bullish());
        bar.close = bar.open;
        assert!(!bar.is_bullish());
    }

    #[test]
    fn validate_accepts_ordered_series() {
        let mut second = sample_bar();
        second.timestamp = ts(10, 15);
        assert!(validate_series(&[sample_bar(), second]).is_ok());
        assert!(validate_series(&[]).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_timestamp() {
        let err = validate_series(&[sample_bar(), sample_bar()]).unwrap_err();
        assert!(matches!(err, TrendscopeError::MalformedSeries { index: 1, .. }));
    }

    #[test]
    fn validate_rejects_non_positive_price() {
        let mut bar = sample_bar();
        bar.low = 0.0;
        let err = validate_series(&[bar]).unwrap_err();
        assert!(matches!(err, TrendscopeError::MalformedSeries { index: 0, .. }));
    }

    #[test]
    fn validate_rejects_nan_close() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(validate_series(&[bar]).is_err());
    }

    #[test]
    fn timeframe_inference() {
        let mut second = sample_bar();
        second.timestamp = ts(10, 15);
        assert_eq!(Timeframe::infer(&[sample_bar(), second.clone()]), Timeframe::M15);

        second.timestamp = ts(11, 0);
        assert_eq!(Timeframe::infer(&[sample_bar(), second.clone()]), Timeframe::H1);

        second.timestamp = ts(10, 1);
        assert_eq!(Timeframe::infer(&[sample_bar(), second]), Timeframe::M1);

        assert_eq!(Timeframe::infer(&[sample_bar()]), Timeframe::Unknown);
    }

    #[test]
    fn timeframe_parse_round_trip() {
        assert_eq!("m15".parse::<Timeframe>().unwrap(), Timeframe::M15);
        assert_eq!(Timeframe::H4.to_string(), "H4");
        assert!("W1".parse::<Timeframe>().is_err());
    }

    #[test]
    fn round_dp_places() {
        assert!((round_dp(1.234_567, 5) - 1.234_57).abs() < 1e-12);
        assert!((round_dp(0.666, 2) - 0.67).abs() < 1e-12);
    }
}

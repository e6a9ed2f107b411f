//! Trend agreement between two timeframes of the same instrument.

use serde::{Deserialize, Serialize};

use crate::domain::analysis::AnalysisConfig;
use crate::domain::levels::{LevelSet, detect_levels};
use crate::domain::ohlcv::{Bar, Timeframe};
use crate::domain::risk::{RiskAdvice, suggest_trade};
use crate::domain::trend::{TrendCall, classify_trend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    StrongConfluence,
    TrendMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeView {
    pub timeframe: Timeframe,
    pub trend: TrendCall,
    pub levels: LevelSet,
    pub risk: RiskAdvice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confluence {
    pub primary: TimeframeView,
    pub secondary: TimeframeView,
    pub agreement: bool,
    pub verdict: Verdict,
}

fn view(timeframe: Timeframe, bars: &[Bar], config: &AnalysisConfig) -> TimeframeView {
    let trend = classify_trend(bars, &config.trend);
    let levels = detect_levels(bars, &config.levels);
    let risk = suggest_trade(bars, trend.direction, &levels, &config.risk);
    TimeframeView {
        timeframe,
        trend,
        levels,
        risk,
    }
}

/// Agreement requires the same directional trend on both timeframes.
pub fn analyze_confluence(
    primary: (Timeframe, &[Bar]),
    secondary: (Timeframe, &[Bar]),
    config: &AnalysisConfig,
) -> Confluence {
    let primary = view(primary.0, primary.1, config);
    let secondary = view(secondary.0, secondary.1, config);

    let agreement = primary.trend.direction == secondary.trend.direction
        && primary.trend.direction.is_directional();
    let verdict = if agreement {
        Verdict::StrongConfluence
    } else {
        Verdict::TrendMismatch
    };

    log::debug!(
        "confluence {}/{}: {} vs {} -> {:?}",
        primary.timeframe,
        secondary.timeframe,
        primary.trend.direction,
        secondary.trend.direction,
        verdict
    );

    Confluence {
        primary,
        secondary,
        agreement,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(closes: impl Iterator<Item = f64>, minutes: i64) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .enumerate()
            .map(|(i, c)| Bar {
                timestamp: start + Duration::minutes(minutes * i as i64),
                open: c,
                high: c + 0.2,
                low: c - 0.2,
                close: c,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn matching_uptrends_agree() {
        let m15 = series((0..60).map(|i| 10.0 + 0.1 * i as f64), 15);
        let h1 = series((0..60).map(|i| 10.0 + 0.3 * i as f64), 60);
        let c = analyze_confluence(
            (Timeframe::M15, &m15),
            (Timeframe::H1, &h1),
            &AnalysisConfig::default(),
        );
        assert!(c.agreement);
        assert_eq!(c.verdict, Verdict::StrongConfluence);
    }

    #[test]
    fn opposite_trends_mismatch() {
        let m15 = series((0..60).map(|i| 10.0 + 0.1 * i as f64), 15);
        let h1 = series((0..60).map(|i| 30.0 - 0.3 * i as f64), 60);
        let c = analyze_confluence(
            (Timeframe::M15, &m15),
            (Timeframe::H1, &h1),
            &AnalysisConfig::default(),
        );
        assert!(!c.agreement);
        assert_eq!(c.verdict, Verdict::TrendMismatch);
    }

    #[test]
    fn shared_sideways_is_not_agreement() {
        let flat = series(std::iter::repeat_n(5.0, 12), 15);
        let c = analyze_confluence(
            (Timeframe::M15, &flat),
            (Timeframe::H1, &flat),
            &AnalysisConfig::default(),
        );
        assert_eq!(c.primary.trend.direction, c.secondary.trend.direction);
        assert!(!c.agreement);
    }
}

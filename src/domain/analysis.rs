//! One-shot analysis of a single instrument/timeframe series.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::indicator_summary::{IndicatorSummary, summarize_indicators};
use crate::domain::levels::{Level, LevelConfig, detect_levels};
use crate::domain::ohlcv::{Bar, Timeframe};
use crate::domain::pattern::{Pattern, PatternConfig, detect_patterns};
use crate::domain::risk::{RiskAdvice, RiskConfig, suggest_trade};
use crate::domain::trend::{TrendCall, TrendConfig, classify_trend};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisConfig {
    pub levels: LevelConfig,
    pub trend: TrendConfig,
    pub patterns: PatternConfig,
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub instrument: String,
    pub timeframe: Timeframe,
    pub bars: usize,
    pub last_timestamp: Option<NaiveDateTime>,
    pub last_close: Option<f64>,
    pub trend: TrendCall,
    pub support: Vec<Level>,
    pub resistance: Vec<Level>,
    pub patterns: Vec<Pattern>,
    pub indicators: IndicatorSummary,
    pub risk: RiskAdvice,
}

/// Run every analysis component over `bars`. `timeframe` is inferred from the
/// bar spacing when the caller passes `Timeframe::Unknown`.
pub fn analyze(
    instrument: &str,
    timeframe: Timeframe,
    bars: &[Bar],
    config: &AnalysisConfig,
) -> AnalysisSummary {
    let timeframe = match timeframe {
        Timeframe::Unknown => Timeframe::infer(bars),
        tf => tf,
    };

    let trend = classify_trend(bars, &config.trend);
    let levels = detect_levels(bars, &config.levels);
    let patterns = detect_patterns(bars, &config.patterns);
    let indicators = summarize_indicators(bars);
    let risk = suggest_trade(bars, trend.direction, &levels, &config.risk);

    log::info!(
        "{} {}: {} ({:.2}), {} support, {} resistance, {} patterns",
        instrument,
        timeframe,
        trend.direction,
        trend.confidence,
        levels.support.len(),
        levels.resistance.len(),
        patterns.len()
    );

    AnalysisSummary {
        instrument: instrument.to_string(),
        timeframe,
        bars: bars.len(),
        last_timestamp: bars.last().map(|b| b.timestamp),
        last_close: bars.last().map(|b| b.close),
        trend,
        support: levels.support,
        resistance: levels.resistance,
        patterns,
        indicators,
        risk,
    }
}

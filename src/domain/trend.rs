//! Directional trend call from four independent votes.
//!
//! Votes are evaluated in a fixed order: moving-average alignment, regression
//! slope of recent closes, MACD line against its signal, then price structure
//! (higher highs/lows or lower highs/lows). Two or more bullish votes make an
//! uptrend; the bullish check runs first, so a 2/2 split resolves upward.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::indicator::{calculate_macd_default, calculate_sma};
use crate::domain::ohlcv::{Bar, round_dp};

pub const SLOPE_LOOKBACK: usize = 20;
pub const STRUCTURE_LOOKBACK: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            short_window: 20,
            long_window: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    Uptrend,
    Downtrend,
    Sideways,
}

impl TrendDirection {
    pub fn is_directional(self) -> bool {
        self != TrendDirection::Sideways
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendDirection::Uptrend => "Uptrend",
            TrendDirection::Downtrend => "Downtrend",
            TrendDirection::Sideways => "Sideways",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendCall {
    pub direction: TrendDirection,
    pub confidence: f64,
    pub justification: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub bias: Bias,
    pub reason: String,
}

impl Vote {
    fn bullish(reason: impl Into<String>) -> Self {
        Vote {
            bias: Bias::Bullish,
            reason: reason.into(),
        }
    }

    fn bearish(reason: impl Into<String>) -> Self {
        Vote {
            bias: Bias::Bearish,
            reason: reason.into(),
        }
    }
}

pub fn classify_trend(bars: &[Bar], config: &TrendConfig) -> TrendCall {
    let votes = collect_votes(bars, config);
    let call = decide(&votes);
    log::debug!(
        "trend: {} votes -> {} ({:.2})",
        votes.len(),
        call.direction,
        call.confidence
    );
    call
}

/// Gather the votes that fired, in evaluation order.
pub fn collect_votes(bars: &[Bar], config: &TrendConfig) -> Vec<Vote> {
    let mut votes = Vec::new();
    if bars.is_empty() {
        return votes;
    }
    let last = bars.len() - 1;

    let short = calculate_sma(bars, config.short_window).simple_at(last);
    let long = calculate_sma(bars, config.long_window).simple_at(last);
    if let (Some(short), Some(long)) = (short, long) {
        if short > long {
            votes.push(Vote::bullish(format!(
                "{} SMA is above {} SMA (bullish)",
                config.short_window, config.long_window
            )));
        } else if short < long {
            votes.push(Vote::bearish(format!(
                "{} SMA is below {} SMA (bearish)",
                config.short_window, config.long_window
            )));
        }
    }

    let tail = &bars[bars.len().saturating_sub(SLOPE_LOOKBACK)..];
    let closes: Vec<f64> = tail.iter().map(|b| b.close).collect();
    if let Some(slope) = regression_slope(&closes) {
        if slope > 0.0 {
            votes.push(Vote::bullish("Price slope is upward"));
        } else if slope < 0.0 {
            votes.push(Vote::bearish("Price slope is downward"));
        }
    }

    if let Some(macd) = calculate_macd_default(bars).macd_at(last) {
        if macd.line > macd.signal {
            votes.push(Vote::bullish("MACD shows bullish crossover"));
        } else if macd.line < macd.signal {
            votes.push(Vote::bearish("MACD shows bearish crossover"));
        }
    }

    let recent = &bars[bars.len().saturating_sub(STRUCTURE_LOOKBACK)..];
    if recent.len() >= 2 {
        let rising = recent
            .windows(2)
            .all(|w| w[1].high >= w[0].high && w[1].low >= w[0].low);
        let falling = recent
            .windows(2)
            .all(|w| w[1].high <= w[0].high && w[1].low <= w[0].low);
        if rising {
            votes.push(Vote::bullish("Higher Highs and Higher Lows"));
        } else if falling {
            votes.push(Vote::bearish("Lower Highs and Lower Lows"));
        }
    }

    votes
}

/// Turn votes into a call. Sideways keeps every reason that fired.
pub fn decide(votes: &[Vote]) -> TrendCall {
    let count = |bias: Bias| votes.iter().filter(|v| v.bias == bias).count();
    let reasons_for = |bias: Bias| -> Vec<String> {
        votes
            .iter()
            .filter(|v| v.bias == bias)
            .map(|v| v.reason.clone())
            .collect()
    };

    let bullish = count(Bias::Bullish);
    let bearish = count(Bias::Bearish);

    if bullish >= 2 {
        TrendCall {
            direction: TrendDirection::Uptrend,
            confidence: vote_confidence(bullish),
            justification: reasons_for(Bias::Bullish),
        }
    } else if bearish >= 2 {
        TrendCall {
            direction: TrendDirection::Downtrend,
            confidence: vote_confidence(bearish),
            justification: reasons_for(Bias::Bearish),
        }
    } else {
        TrendCall {
            direction: TrendDirection::Sideways,
            confidence: 0.5,
            justification: votes.iter().map(|v| v.reason.clone()).collect(),
        }
    }
}

fn vote_confidence(votes: usize) -> f64 {
    let raw = 0.6 + 0.1 * (votes as f64 - 2.0);
    round_dp(raw.min(0.95), 2)
}

/// Least-squares slope of `values` against 0..n. `None` for fewer than two points.
pub fn regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        cov += dx * (y - mean_y);
        var += dx * dx;
    }
    Some(cov / var)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, NaiveDate};

    fn ranged_bars(closes: &[f64], half_range: f64) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: start + Duration::hours(i as i64),
                open: c,
                high: c + half_range,
                low: c - half_range,
                close: c,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn slope_of_line() {
        assert_abs_diff_eq!(regression_slope(&[1.0, 3.0, 5.0, 7.0]).unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(regression_slope(&[4.0, 4.0, 4.0]).unwrap(), 0.0, epsilon = 1e-12);
        assert_eq!(regression_slope(&[1.0]), None);
    }

    #[test]
    fn two_against_two_resolves_upward() {
        let votes = vec![
            Vote::bullish("a"),
            Vote::bearish("b"),
            Vote::bullish("c"),
            Vote::bearish("d"),
        ];
        let call = decide(&votes);
        assert_eq!(call.direction, TrendDirection::Uptrend);
        assert_abs_diff_eq!(call.confidence, 0.6, epsilon = 1e-12);
        assert_eq!(call.justification, vec!["a", "c"]);
    }

    #[test]
    fn single_votes_are_sideways_with_all_reasons() {
        let votes = vec![Vote::bearish("down"), Vote::bullish("up")];
        let call = decide(&votes);
        assert_eq!(call.direction, TrendDirection::Sideways);
        assert_abs_diff_eq!(call.confidence, 0.5, epsilon = 1e-12);
        assert_eq!(call.justification, vec!["down", "up"]);
    }

    #[test]
    fn three_bearish_votes() {
        let votes = vec![
            Vote::bearish("x"),
            Vote::bearish("y"),
            Vote::bullish("z"),
            Vote::bearish("w"),
        ];
        let call = decide(&votes);
        assert_eq!(call.direction, TrendDirection::Downtrend);
        assert_abs_diff_eq!(call.confidence, 0.7, epsilon = 1e-12);
        assert_eq!(call.justification, vec!["x", "y", "w"]);
    }

    #[test]
    fn confidence_caps_at_four_votes() {
        assert_abs_diff_eq!(vote_confidence(4), 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(vote_confidence(9), 0.95, epsilon = 1e-12);
    }

    #[test]
    fn rising_series_is_an_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let call = classify_trend(&ranged_bars(&closes, 0.5), &TrendConfig::default());

        assert_eq!(call.direction, TrendDirection::Uptrend);
        assert!(call.confidence >= 0.6);
        assert!(call.justification.contains(&"20 SMA is above 50 SMA (bullish)".to_string()));
        assert!(call.justification.contains(&"Price slope is upward".to_string()));
        assert!(call.justification.contains(&"Higher Highs and Higher Lows".to_string()));
    }

    #[test]
    fn falling_series_is_a_downtrend() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let call = classify_trend(&ranged_bars(&closes, 0.5), &TrendConfig::default());

        assert_eq!(call.direction, TrendDirection::Downtrend);
        assert_eq!(call.justification[0], "20 SMA is below 50 SMA (bearish)");
    }

    #[test]
    fn flat_series_is_sideways() {
        let closes = vec![100.0; 12];
        let call = classify_trend(&ranged_bars(&closes, 0.5), &TrendConfig::default());

        // Flat highs and lows are both non-strictly rising: one vote only.
        assert_eq!(call.direction, TrendDirection::Sideways);
        assert_eq!(call.justification, vec!["Higher Highs and Higher Lows"]);
    }

    #[test]
    fn short_series_skips_indicator_votes() {
        let closes: Vec<f64> = (0..12).map(|i| 50.0 + i as f64).collect();
        let votes = collect_votes(&ranged_bars(&closes, 0.2), &TrendConfig::default());
        // Only slope and structure can vote without a full SMA/MACD warm-up.
        assert_eq!(votes.len(), 2);
        assert!(votes.iter().all(|v| v.bias == Bias::Bullish));
    }

    #[test]
    fn split_votes_on_a_pullback_resolve_upward() {
        // A long rally then ten bars of gentle decline: averages and slope stay
        // bullish while MACD and structure turn bearish.
        let mut closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        closes.extend((1..=10).map(|i| 199.0 - 0.3 * i as f64));
        let bars = ranged_bars(&closes, 0.5);

        let votes = collect_votes(&bars, &TrendConfig::default());
        let biases: Vec<Bias> = votes.iter().map(|v| v.bias).collect();
        assert_eq!(
            biases,
            vec![Bias::Bullish, Bias::Bullish, Bias::Bearish, Bias::Bearish]
        );

        let call = classify_trend(&bars, &TrendConfig::default());
        assert_eq!(call.direction, TrendDirection::Uptrend);
        assert_abs_diff_eq!(call.confidence, 0.6, epsilon = 1e-12);
        assert_eq!(
            call.justification,
            vec!["20 SMA is above 50 SMA (bullish)", "Price slope is upward"]
        );
    }

    #[test]
    fn empty_series_is_sideways() {
        let call = classify_trend(&[], &TrendConfig::default());
        assert_eq!(call.direction, TrendDirection::Sideways);
        assert!(call.justification.is_empty());
    }
}

//! Double top and double bottom detection on closing prices.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::extrema::{find_peaks, find_troughs};
use crate::domain::ohlcv::{Bar, round_dp};

/// Bars after an accepted pattern's second anchor during which no new pattern
/// of the same kind may start.
pub const OVERLAP_WINDOW: usize = 30;
pub const VALIDATION_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct PatternConfig {
    /// Maximum relative difference between the two anchors.
    pub threshold: f64,
    pub min_distance: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        PatternConfig {
            threshold: 0.005,
            min_distance: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    DoubleTop,
    DoubleBottom,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::DoubleTop => f.write_str("Double Top"),
            PatternKind::DoubleBottom => f.write_str("Double Bottom"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternStatus {
    Forming,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub status: PatternStatus,
    pub first_anchor: f64,
    pub second_anchor: f64,
    pub neckline: f64,
    pub target: f64,
    pub validation_confidence: f64,
}

/// Latest double top (if any) followed by latest double bottom (if any).
pub fn detect_patterns(bars: &[Bar], config: &PatternConfig) -> Vec<Pattern> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let peaks = find_peaks(&closes, config.min_distance);
    let troughs = find_troughs(&closes, config.min_distance);

    let top = scan(&closes, &peaks, PatternKind::DoubleTop, config.threshold);
    let bottom = scan(&closes, &troughs, PatternKind::DoubleBottom, config.threshold);

    log::debug!(
        "patterns: {} peaks, {} troughs, top={}, bottom={}",
        peaks.len(),
        troughs.len(),
        top.is_some(),
        bottom.is_some()
    );

    top.into_iter().chain(bottom).collect()
}

/// Walk adjacent anchor pairs and return the last accepted pattern.
fn scan(closes: &[f64], anchors: &[usize], kind: PatternKind, threshold: f64) -> Option<Pattern> {
    let mut latest = None;
    let mut last_accepted: Option<usize> = None;

    for pair in anchors.windows(2) {
        let (a1, a2) = (pair[0], pair[1]);
        if let Some(prev) = last_accepted {
            if a1 < prev + OVERLAP_WINDOW {
                continue;
            }
        }

        let (p1, p2) = (closes[a1], closes[a2]);
        if (p1 - p2).abs() / p1 >= threshold {
            continue;
        }

        let between = &closes[a1 + 1..a2];
        let neckline = match kind {
            PatternKind::DoubleTop => between
                .iter()
                .copied()
                .reduce(f64::min)
                .filter(|&m| m < p1.min(p2)),
            PatternKind::DoubleBottom => between
                .iter()
                .copied()
                .reduce(f64::max)
                .filter(|&m| m > p1.max(p2)),
        };
        let Some(neckline) = neckline else {
            continue;
        };

        let target = match kind {
            PatternKind::DoubleTop => neckline - (p1 - neckline),
            PatternKind::DoubleBottom => neckline + (neckline - p1),
        };
        let status = if a2 + 2 >= closes.len() {
            PatternStatus::Forming
        } else {
            PatternStatus::Completed
        };

        latest = Some(Pattern {
            kind,
            status,
            first_anchor: round_dp(p1, 5),
            second_anchor: round_dp(p2, 5),
            neckline: round_dp(neckline, 5),
            target: round_dp(target, 5),
            validation_confidence: VALIDATION_CONFIDENCE,
        });
        last_accepted = Some(a2);
    }

    latest
}

//! Bar-by-bar resolution of a trade candidate.
//!
//! Starting on the bar after entry, the first bar that touches the stop or the
//! target closes the trade. When a single bar touches both, the stop wins.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ohlcv::{Bar, round_dp};
use crate::domain::strategy::TradeCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeResult {
    Win,
    Loss,
    Open,
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeResult::Win => f.write_str("win"),
            TradeResult::Loss => f.write_str("loss"),
            TradeResult::Open => f.write_str("open"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub candidate: TradeCandidate,
    pub result: TradeResult,
    pub profit: f64,
    pub closed_at: NaiveDateTime,
    pub risk_reward: f64,
}

/// Resolve `candidate` against the bars that follow it. `None` when the
/// candidate's bar index is outside the series.
pub fn simulate_trade(candidate: &TradeCandidate, bars: &[Bar]) -> Option<TradeOutcome> {
    let last = bars.last()?;
    if candidate.bar_index >= bars.len() {
        return None;
    }

    let (result, profit, closed_at) = bars[candidate.bar_index + 1..]
        .iter()
        .find_map(|bar| {
            if candidate.hits_stop(bar) {
                Some((TradeResult::Loss, -candidate.risk(), bar.timestamp))
            } else if candidate.hits_target(bar) {
                Some((TradeResult::Win, candidate.reward(), bar.timestamp))
            } else {
                None
            }
        })
        .unwrap_or((TradeResult::Open, 0.0, last.timestamp));

    let risk = candidate.risk();
    let risk_reward = if risk > 0.0 {
        round_dp(candidate.reward() / risk, 2)
    } else {
        0.0
    };

    Some(TradeOutcome {
        candidate: candidate.clone(),
        result,
        profit: round_dp(profit, 5),
        closed_at,
        risk_reward,
    })
}

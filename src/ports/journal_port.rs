//! Trade journal port trait.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendscopeError;
use crate::domain::execution::TradeOutcome;
use crate::domain::risk::RiskSuggestion;

pub const LIVE_SIGNAL_STRATEGY: &str = "Live Signal";
pub const PENDING_RESULT: &str = "Pending";

/// One row of the flat trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub strategy: String,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub result: String,
    pub risk_reward: f64,
    pub date: NaiveDateTime,
    pub screenshot: Option<String>,
}

impl JournalEntry {
    pub fn from_outcome(strategy: &str, outcome: &TradeOutcome) -> Self {
        JournalEntry {
            strategy: strategy.to_string(),
            entry: outcome.candidate.entry,
            stop_loss: outcome.candidate.stop_loss,
            take_profit: outcome.candidate.take_profit,
            result: outcome.result.to_string(),
            risk_reward: outcome.risk_reward,
            date: outcome.closed_at,
            screenshot: None,
        }
    }

    /// A suggested trade that has not been resolved yet.
    pub fn from_suggestion(suggestion: &RiskSuggestion, date: NaiveDateTime) -> Self {
        JournalEntry {
            strategy: LIVE_SIGNAL_STRATEGY.to_string(),
            entry: suggestion.entry,
            stop_loss: suggestion.stop_loss,
            take_profit: suggestion.take_profits.first().copied().unwrap_or(0.0),
            result: PENDING_RESULT.to_string(),
            risk_reward: suggestion.risk_reward,
            date,
            screenshot: None,
        }
    }

    pub fn from_backtest(result: &BacktestResult) -> Vec<Self> {
        let name = result.strategy.name();
        result
            .trades
            .iter()
            .map(|t| JournalEntry::from_outcome(name, t))
            .collect()
    }
}

/// Append-only trade log.
pub trait JournalPort {
    fn append(&self, entries: &[JournalEntry]) -> Result<(), TrendscopeError>;
}

//! Trade suggestion with ATR-based stops, position sizing and a signal score.
//!
//! The advisor never fails: thin data and sideways markets come back as
//! [`RiskAdvice::NoTrade`] with a reason and a readable note.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::indicator::{atr, calculate_atr};
use crate::domain::levels::LevelSet;
use crate::domain::ohlcv::{Bar, round_dp};
use crate::domain::trend::TrendDirection;

pub const MIN_BARS: usize = 20;
pub const FALLBACK_RANGE_BARS: usize = 5;

/// Score contribution for indicator agreement. Indicators are not consulted
/// yet; every suggestion receives it.
const ASSUMED_ALIGNMENT_POINTS: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub risk_percent: f64,
    pub capital: f64,
    pub rr_threshold: f64,
    pub slippage: f64,
    pub atr_period: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            risk_percent: 1.0,
            capital: 10_000.0,
            rr_threshold: 1.5,
            slippage: 0.0002,
            atr_period: atr::DEFAULT_PERIOD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    Long,
    Short,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => f.write_str("Long"),
            TradeDirection::Short => f.write_str("Short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreLevel {
    Weak,
    Moderate,
    Strong,
}

impl ScoreLevel {
    pub fn from_score(value: u32) -> Self {
        match value {
            v if v >= 75 => ScoreLevel::Strong,
            v if v >= 50 => ScoreLevel::Moderate,
            _ => ScoreLevel::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub value: u32,
    pub level: ScoreLevel,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryZone {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtrSource {
    Wilder,
    RangeFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSuggestion {
    pub direction: TradeDirection,
    pub entry: f64,
    pub entry_zone: EntryZone,
    pub stop_loss: f64,
    pub take_profits: Vec<f64>,
    pub risk_reward: f64,
    pub position_size: f64,
    pub risk_capital: f64,
    pub atr: f64,
    pub atr_source: AtrSource,
    pub trailing_stop: f64,
    pub slippage: f64,
    pub rr_warning: Option<String>,
    pub nearest_support: Option<f64>,
    pub nearest_resistance: Option<f64>,
    pub score: SignalScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoTradeReason {
    InsufficientData,
    NoClearDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskAdvice {
    Trade(RiskSuggestion),
    NoTrade { reason: NoTradeReason, note: String },
}

impl RiskAdvice {
    pub fn suggestion(&self) -> Option<&RiskSuggestion> {
        match self {
            RiskAdvice::Trade(s) => Some(s),
            RiskAdvice::NoTrade { .. } => None,
        }
    }

    fn insufficient(len: usize) -> Self {
        RiskAdvice::NoTrade {
            reason: NoTradeReason::InsufficientData,
            note: format!("Not enough candles to compute ATR (need {MIN_BARS}, got {len})."),
        }
    }
}

pub fn suggest_trade(
    bars: &[Bar],
    trend: TrendDirection,
    levels: &LevelSet,
    config: &RiskConfig,
) -> RiskAdvice {
    let Some(last) = bars.last().filter(|_| bars.len() >= MIN_BARS) else {
        return RiskAdvice::insufficient(bars.len());
    };

    let (atr_value, atr_source) = match calculate_atr(bars, config.atr_period)
        .last_valid_simple()
        .filter(|v| v.is_finite())
    {
        Some(v) => (v, AtrSource::Wilder),
        None => {
            let recent = &bars[bars.len() - FALLBACK_RANGE_BARS..];
            let mean = recent.iter().map(Bar::range).sum::<f64>() / FALLBACK_RANGE_BARS as f64;
            log::warn!(
                "ATR({}) unavailable, falling back to {}-bar mean range {:.5}",
                config.atr_period,
                FALLBACK_RANGE_BARS,
                mean
            );
            (mean, AtrSource::RangeFallback)
        }
    };

    if !atr_value.is_finite() || atr_value == 0.0 {
        return RiskAdvice::insufficient(bars.len());
    }

    let close = last.close;
    let (direction, entry, stop_loss, take_profit, trailing_stop) = match trend {
        TrendDirection::Uptrend => {
            let entry = round_dp(close + config.slippage, 5);
            (
                TradeDirection::Long,
                entry,
                round_dp(entry - atr_value, 5),
                round_dp(entry + 2.0 * atr_value, 5),
                round_dp(close - atr_value, 5),
            )
        }
        TrendDirection::Downtrend => {
            let entry = round_dp(close - config.slippage, 5);
            (
                TradeDirection::Short,
                entry,
                round_dp(entry + atr_value, 5),
                round_dp(entry - 2.0 * atr_value, 5),
                round_dp(close + atr_value, 5),
            )
        }
        TrendDirection::Sideways => {
            return RiskAdvice::NoTrade {
                reason: NoTradeReason::NoClearDirection,
                note: "Trend not strong enough to justify a trade".into(),
            };
        }
    };

    let risk = (entry - stop_loss).abs();
    let reward = (take_profit - entry).abs();
    let risk_reward = if risk > 0.0 {
        round_dp(reward / risk, 2)
    } else {
        0.0
    };

    let rr_warning = (risk_reward < config.rr_threshold).then(|| {
        format!(
            "Risk-Reward Ratio {:?} is below threshold {:?}",
            risk_reward, config.rr_threshold
        )
    });

    let risk_capital = config.capital * (config.risk_percent / 100.0);
    let position_size = if risk > 0.0 {
        round_dp(risk_capital / risk, 2)
    } else {
        0.0
    };

    let score = score_signal(risk_reward, atr_value);

    log::debug!(
        "risk: {} entry={} stop={} target={} rr={} score={}",
        direction,
        entry,
        stop_loss,
        take_profit,
        risk_reward,
        score.value
    );

    RiskAdvice::Trade(RiskSuggestion {
        direction,
        entry,
        entry_zone: EntryZone {
            low: round_dp(entry * 0.999, 5),
            high: round_dp(entry * 1.001, 5),
        },
        stop_loss,
        take_profits: vec![take_profit],
        risk_reward,
        position_size,
        risk_capital: round_dp(risk_capital, 2),
        atr: round_dp(atr_value, 5),
        atr_source,
        trailing_stop,
        slippage: config.slippage,
        rr_warning,
        nearest_support: levels.nearest_support().map(|l| l.price),
        nearest_resistance: levels.nearest_resistance().map(|l| l.price),
        score,
    })
}

/// Only reached for directional trends, so the trend points always apply.
fn score_signal(risk_reward: f64, atr_value: f64) -> SignalScore {
    let mut value = 30;
    let mut reasons = vec!["Trend confirmed".to_string()];

    value += ASSUMED_ALIGNMENT_POINTS;
    reasons.push("Indicators assumed aligned".into());

    let (points, label) = if risk_reward >= 2.0 {
        (30, "RR ≥ 2.0")
    } else if risk_reward >= 1.5 {
        (20, "RR ≥ 1.5")
    } else if risk_reward >= 1.2 {
        (10, "RR ≥ 1.2")
    } else {
        (0, "Poor RR")
    };
    value += points;
    reasons.push(label.into());

    if atr_value > 0.0 {
        value += 20;
        reasons.push("ATR valid".into());
    }

    SignalScore {
        value,
        level: ScoreLevel::from_score(value),
        reasons,
    }
}

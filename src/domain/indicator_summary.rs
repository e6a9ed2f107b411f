//! Latest-bar digest of RSI, MACD and the 50/200 moving averages.
//!
//! Readings still in warm-up are reported as `None`; the statuses derived from
//! them fall through to their neutral variant.

use serde::{Deserialize, Serialize};

use crate::domain::indicator::{calculate_macd_default, calculate_rsi, calculate_sma, rsi};
use crate::domain::ohlcv::{Bar, round_dp};

pub const SMA_MEDIUM: usize = 50;
pub const SMA_LONG: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiStatus {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdStatus {
    BullishCrossover,
    BearishCrossover,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistogramDirection {
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRelation {
    AboveBoth,
    BelowBoth,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaCrossover {
    GoldenCross,
    DeathCross,
    NoCrossover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorBias {
    Bullish,
    Bearish,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSummary {
    pub rsi: Option<f64>,
    pub rsi_status: RsiStatus,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_status: MacdStatus,
    pub histogram: HistogramDirection,
    pub price_relation: PriceRelation,
    pub crossover: MaCrossover,
    pub bias: IndicatorBias,
}

pub fn summarize_indicators(bars: &[Bar]) -> IndicatorSummary {
    let last = bars.len().checked_sub(1);

    let rsi_series = calculate_rsi(bars, rsi::DEFAULT_PERIOD);
    let rsi = last.and_then(|i| rsi_series.simple_at(i));
    let rsi_status = match rsi {
        Some(v) if v > 70.0 => RsiStatus::Overbought,
        Some(v) if v < 30.0 => RsiStatus::Oversold,
        _ => RsiStatus::Neutral,
    };

    let macd = calculate_macd_default(bars);
    let reading = last.and_then(|i| macd.macd_at(i));
    let macd_status = match reading {
        Some(m) if m.line > m.signal => MacdStatus::BullishCrossover,
        Some(m) if m.line < m.signal => MacdStatus::BearishCrossover,
        _ => MacdStatus::Neutral,
    };
    let previous = last
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| macd.macd_at(i));
    let histogram = match (reading, previous) {
        (Some(now), Some(before)) if now.histogram > before.histogram => {
            HistogramDirection::Increasing
        }
        _ => HistogramDirection::Decreasing,
    };

    let medium_series = calculate_sma(bars, SMA_MEDIUM);
    let long_series = calculate_sma(bars, SMA_LONG);
    let medium = last.and_then(|i| medium_series.simple_at(i));
    let long = last.and_then(|i| long_series.simple_at(i));

    let price_relation = match (bars.last().map(|b| b.close), medium, long) {
        (Some(p), Some(m), Some(l)) if p > m && p > l => PriceRelation::AboveBoth,
        (Some(p), Some(m), Some(l)) if p < m && p < l => PriceRelation::BelowBoth,
        _ => PriceRelation::Mixed,
    };
    let crossover = match (medium, long) {
        (Some(m), Some(l)) if m > l => MaCrossover::GoldenCross,
        (Some(m), Some(l)) if m < l => MaCrossover::DeathCross,
        _ => MaCrossover::NoCrossover,
    };

    let bias = match (rsi_status, macd_status, price_relation) {
        (RsiStatus::Oversold, MacdStatus::BullishCrossover, PriceRelation::AboveBoth) => {
            IndicatorBias::Bullish
        }
        (RsiStatus::Overbought, MacdStatus::BearishCrossover, PriceRelation::BelowBoth) => {
            IndicatorBias::Bearish
        }
        _ => IndicatorBias::Mixed,
    };

    IndicatorSummary {
        rsi: rsi.map(|v| round_dp(v, 2)),
        rsi_status,
        macd_line: reading.map(|m| round_dp(m.line, 5)),
        macd_signal: reading.map(|m| round_dp(m.signal, 5)),
        macd_status,
        histogram,
        price_relation,
        crossover,
        bias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn short_series_is_neutral() {
        let s = summarize_indicators(&make_bars(&[1.0, 1.1, 1.2]));
        assert_eq!(s.rsi, None);
        assert_eq!(s.rsi_status, RsiStatus::Neutral);
        assert_eq!(s.macd_status, MacdStatus::Neutral);
        assert_eq!(s.price_relation, PriceRelation::Mixed);
        assert_eq!(s.crossover, MaCrossover::NoCrossover);
        assert_eq!(s.bias, IndicatorBias::Mixed);
    }

    #[test]
    fn empty_series() {
        let s = summarize_indicators(&[]);
        assert_eq!(s.rsi, None);
        assert_eq!(s.histogram, HistogramDirection::Decreasing);
    }

    #[test]
    fn long_rally_is_overbought_above_both() {
        let closes: Vec<f64> = (0..220).map(|i| 100.0 + i as f64 * 0.5).collect();
        let s = summarize_indicators(&make_bars(&closes));

        assert_eq!(s.rsi, Some(100.0));
        assert_eq!(s.rsi_status, RsiStatus::Overbought);
        assert_eq!(s.price_relation, PriceRelation::AboveBoth);
        assert_eq!(s.crossover, MaCrossover::GoldenCross);
        // Overbought in an uptrend is not a confirmed bias either way.
        assert_eq!(s.bias, IndicatorBias::Mixed);
    }

    #[test]
    fn long_decline_is_oversold_below_both() {
        let closes: Vec<f64> = (0..220).map(|i| 300.0 - i as f64 * 0.5).collect();
        let s = summarize_indicators(&make_bars(&closes));

        assert_eq!(s.rsi_status, RsiStatus::Oversold);
        assert_eq!(s.price_relation, PriceRelation::BelowBoth);
        assert_eq!(s.crossover, MaCrossover::DeathCross);
        assert_eq!(s.bias, IndicatorBias::Mixed);
    }
}

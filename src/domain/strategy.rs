//! Entry-signal strategies.
//!
//! Each [`StrategyKind`] is a stateless rule set over the bar series. Every
//! candidate uses fixed percentage exits: buys stop 1% below and target 2%
//! above the signalling close, sells mirror that.
//!
//! [`StrategyKind::CustomRule`] is the one compound rule: buy wherever the MACD
//! line is above its signal while RSI(14) is below 30.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::TrendscopeError;
use crate::domain::indicator::{
    atr, bollinger, calculate_atr, calculate_bollinger, calculate_macd_default, calculate_rsi,
    calculate_sma, rsi,
};
use crate::domain::ohlcv::Bar;

pub const STOP_PCT: f64 = 0.01;
pub const TARGET_PCT: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("Buy"),
            Side::Sell => f.write_str("Sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub side: Side,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub bar_index: usize,
}

impl TradeCandidate {
    /// Candidate at `close` with the standard percentage exits.
    pub fn at_close(side: Side, close: f64, bar_index: usize) -> Self {
        let (stop_loss, take_profit) = match side {
            Side::Buy => (close * (1.0 - STOP_PCT), close * (1.0 + TARGET_PCT)),
            Side::Sell => (close * (1.0 + STOP_PCT), close * (1.0 - TARGET_PCT)),
        };
        TradeCandidate {
            side,
            entry: close,
            stop_loss,
            take_profit,
            bar_index,
        }
    }

    pub fn hits_stop(&self, bar: &Bar) -> bool {
        match self.side {
            Side::Buy => bar.low <= self.stop_loss,
            Side::Sell => bar.high >= self.stop_loss,
        }
    }

    pub fn hits_target(&self, bar: &Bar) -> bool {
        match self.side {
            Side::Buy => bar.high >= self.take_profit,
            Side::Sell => bar.low <= self.take_profit,
        }
    }

    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }

    pub fn reward(&self) -> f64 {
        (self.take_profit - self.entry).abs()
    }
}

/// Anything that turns a bar series into entry candidates.
pub trait SignalGenerator {
    fn generate(&self, bars: &[Bar]) -> Vec<TradeCandidate>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    MaCrossover,
    MacdSignal,
    PatternTrigger,
    RsiReversal,
    BollingerBounce,
    AtrBreakout,
    CustomRule,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::MaCrossover,
        StrategyKind::MacdSignal,
        StrategyKind::PatternTrigger,
        StrategyKind::RsiReversal,
        StrategyKind::BollingerBounce,
        StrategyKind::AtrBreakout,
        StrategyKind::CustomRule,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::MaCrossover => "MA Crossover",
            StrategyKind::MacdSignal => "MACD Signal",
            StrategyKind::PatternTrigger => "Pattern Trigger",
            StrategyKind::RsiReversal => "RSI Reversal",
            StrategyKind::BollingerBounce => "Bollinger Bounce",
            StrategyKind::AtrBreakout => "ATR Breakout",
            StrategyKind::CustomRule => "Custom Rule",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = TrendscopeError;

    /// Accepts the display name in any case, with spaces, dashes or
    /// underscores as separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.name().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| TrendscopeError::InvalidStrategy {
                name: s.to_string(),
            })
    }
}

impl SignalGenerator for StrategyKind {
    fn generate(&self, bars: &[Bar]) -> Vec<TradeCandidate> {
        let candidates = match self {
            StrategyKind::MaCrossover => ma_crossover(bars),
            StrategyKind::MacdSignal => macd_signal(bars),
            StrategyKind::PatternTrigger => pattern_trigger(bars),
            StrategyKind::RsiReversal => rsi_reversal(bars),
            StrategyKind::BollingerBounce => bollinger_bounce(bars),
            StrategyKind::AtrBreakout => atr_breakout(bars),
            StrategyKind::CustomRule => custom_rule(bars),
        };
        log::debug!("{}: {} candidates", self, candidates.len());
        candidates
    }
}

/// Direction of a crossing between `a` and `b` from bar `i - 1` to bar `i`.
fn crossing(prev: (Option<f64>, Option<f64>), curr: (Option<f64>, Option<f64>)) -> Option<Side> {
    let (Some(pa), Some(pb)) = prev else {
        return None;
    };
    let (Some(a), Some(b)) = curr else {
        return None;
    };
    if a > b && pa <= pb {
        Some(Side::Buy)
    } else if a < b && pa >= pb {
        Some(Side::Sell)
    } else {
        None
    }
}

const MA_FAST: usize = 10;
const MA_SLOW: usize = 30;

fn ma_crossover(bars: &[Bar]) -> Vec<TradeCandidate> {
    let fast = calculate_sma(bars, MA_FAST);
    let slow = calculate_sma(bars, MA_SLOW);

    (MA_SLOW..bars.len())
        .filter_map(|i| {
            let side = crossing(
                (fast.simple_at(i - 1), slow.simple_at(i - 1)),
                (fast.simple_at(i), slow.simple_at(i)),
            )?;
            Some(TradeCandidate::at_close(side, bars[i].close, i))
        })
        .collect()
}

fn macd_signal(bars: &[Bar]) -> Vec<TradeCandidate> {
    let macd = calculate_macd_default(bars);
    let pair = |i: usize| {
        macd.macd_at(i)
            .map_or((None, None), |m| (Some(m.line), Some(m.signal)))
    };

    (1..bars.len())
        .filter_map(|i| {
            let side = crossing(pair(i - 1), pair(i))?;
            Some(TradeCandidate::at_close(side, bars[i].close, i))
        })
        .collect()
}

const PATTERN_START: usize = 20;
const PATTERN_LOOKBACK: usize = 5;

/// Fades short runs: five rising closes sell, five falling closes buy.
fn pattern_trigger(bars: &[Bar]) -> Vec<TradeCandidate> {
    (PATTERN_START..bars.len())
        .filter_map(|i| {
            let recent = &bars[i - PATTERN_LOOKBACK..i];
            let side = if recent.windows(2).all(|w| w[1].close >= w[0].close) {
                Side::Sell
            } else if recent.windows(2).all(|w| w[1].close <= w[0].close) {
                Side::Buy
            } else {
                return None;
            };
            Some(TradeCandidate::at_close(side, bars[i].close, i))
        })
        .collect()
}

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;

fn rsi_reversal(bars: &[Bar]) -> Vec<TradeCandidate> {
    let rsi_series = calculate_rsi(bars, rsi::DEFAULT_PERIOD);

    (1..bars.len())
        .filter_map(|i| {
            let (Some(prev), Some(curr)) = (rsi_series.simple_at(i - 1), rsi_series.simple_at(i))
            else {
                return None;
            };
            let side = if curr > RSI_OVERSOLD && prev <= RSI_OVERSOLD {
                Side::Buy
            } else if curr < RSI_OVERBOUGHT && prev >= RSI_OVERBOUGHT {
                Side::Sell
            } else {
                return None;
            };
            Some(TradeCandidate::at_close(side, bars[i].close, i))
        })
        .collect()
}

fn bollinger_bounce(bars: &[Bar]) -> Vec<TradeCandidate> {
    let bands = calculate_bollinger(
        bars,
        bollinger::DEFAULT_PERIOD,
        bollinger::DEFAULT_STDDEV_MULT_X100,
    );
    let rsi_series = calculate_rsi(bars, rsi::DEFAULT_PERIOD);

    (1..bars.len())
        .filter_map(|i| {
            let band = bands.bollinger_at(i)?;
            let (Some(prev), Some(curr)) = (rsi_series.simple_at(i - 1), rsi_series.simple_at(i))
            else {
                return None;
            };
            let close = bars[i].close;
            let side = if close < band.lower && curr > prev {
                Side::Buy
            } else if close > band.upper && curr < prev {
                Side::Sell
            } else {
                return None;
            };
            Some(TradeCandidate::at_close(side, close, i))
        })
        .collect()
}

const BREAKOUT_START: usize = 14;
const BREAKOUT_MULT: f64 = 1.5;

fn atr_breakout(bars: &[Bar]) -> Vec<TradeCandidate> {
    let atr_series = calculate_atr(bars, atr::DEFAULT_PERIOD);

    (BREAKOUT_START..bars.len())
        .filter_map(|i| {
            let value = atr_series.simple_at(i)?;
            let bar = &bars[i];
            if bar.range() <= BREAKOUT_MULT * value {
                return None;
            }
            let side = if bar.is_bullish() { Side::Buy } else { Side::Sell };
            Some(TradeCandidate::at_close(side, bar.close, i))
        })
        .collect()
}

/// Every bar satisfying the rule is a candidate, not just the first one.
fn custom_rule(bars: &[Bar]) -> Vec<TradeCandidate> {
    let macd = calculate_macd_default(bars);
    let rsi_series = calculate_rsi(bars, rsi::DEFAULT_PERIOD);

    (1..bars.len())
        .filter_map(|i| {
            let m = macd.macd_at(i)?;
            let r = rsi_series.simple_at(i)?;
            (m.line > m.signal && r < RSI_OVERSOLD)
                .then(|| TradeCandidate::at_close(Side::Buy, bars[i].close, i))
        })
        .collect()
}

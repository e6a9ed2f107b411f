//! Strategy backtest: generate candidates, resolve each one, tally results.
//!
//! Candidates are resolved independently. Overlapping trades are allowed and
//! there is no position or capital accounting beyond the metrics' equity curve.

use serde::{Deserialize, Serialize};

use crate::domain::execution::{TradeOutcome, TradeResult, simulate_trade};
use crate::domain::metrics::BacktestMetrics;
use crate::domain::ohlcv::Bar;
use crate::domain::strategy::{SignalGenerator, StrategyKind};

/// Series shorter than this produce an empty result.
pub const MIN_BACKTEST_BARS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub capital: f64,
    pub strategy: StrategyKind,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            capital: 10_000.0,
            strategy: StrategyKind::MaCrossover,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy: StrategyKind,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub open: usize,
    pub winrate: f64,
    pub trades: Vec<TradeOutcome>,
}

impl BacktestResult {
    fn empty(strategy: StrategyKind) -> Self {
        BacktestResult {
            strategy,
            total: 0,
            wins: 0,
            losses: 0,
            open: 0,
            winrate: 0.0,
            trades: Vec::new(),
        }
    }

    pub fn metrics(&self, capital: f64) -> BacktestMetrics {
        BacktestMetrics::compute(&self.trades, capital)
    }

    pub fn cumulative_profit(&self) -> f64 {
        self.trades.iter().map(|t| t.profit).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub strategy: StrategyKind,
    pub total: usize,
    pub wins: usize,
    pub losses: usize,
    pub winrate: f64,
    pub cumulative_profit: f64,
}

pub fn run_backtest(bars: &[Bar], config: &BacktestConfig) -> BacktestResult {
    run_backtest_with(bars, config.strategy, &config.strategy)
}

/// Backtest with any [`SignalGenerator`], reported under `label`.
pub fn run_backtest_with<G: SignalGenerator + ?Sized>(
    bars: &[Bar],
    label: StrategyKind,
    generator: &G,
) -> BacktestResult {
    if bars.len() < MIN_BACKTEST_BARS {
        log::debug!(
            "{}: {} bars is below the {} bar minimum",
            label,
            bars.len(),
            MIN_BACKTEST_BARS
        );
        return BacktestResult::empty(label);
    }

    let trades: Vec<TradeOutcome> = generator
        .generate(bars)
        .iter()
        .filter_map(|c| simulate_trade(c, bars))
        .collect();

    let count = |r: TradeResult| trades.iter().filter(|t| t.result == r).count();
    let wins = count(TradeResult::Win);
    let losses = count(TradeResult::Loss);
    let open = count(TradeResult::Open);
    let total = trades.len();
    let winrate = if total > 0 {
        100.0 * wins as f64 / total as f64
    } else {
        0.0
    };

    log::debug!(
        "{}: {} trades, {} wins, {} losses, {} open",
        label,
        total,
        wins,
        losses,
        open
    );

    BacktestResult {
        strategy: label,
        total,
        wins,
        losses,
        open,
        winrate,
        trades,
    }
}

/// Backtest every strategy on the same series.
pub fn compare_strategies(bars: &[Bar]) -> Vec<StrategyComparison> {
    StrategyKind::ALL
        .into_iter()
        .map(|kind| {
            let result = run_backtest_with(bars, kind, &kind);
            StrategyComparison {
                strategy: kind,
                total: result.total,
                wins: result.wins,
                losses: result.losses,
                winrate: result.winrate,
                cumulative_profit: result.cumulative_profit(),
            }
        })
        .collect()
}

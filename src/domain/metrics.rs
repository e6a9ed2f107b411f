//! Performance metrics over a sequence of resolved trades.
//!
//! Everything here is indexed by trade, not by bar: the equity curve has one
//! point per outcome and the Sharpe ratio treats each trade's profit as one
//! return sample.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::execution::{TradeOutcome, TradeResult};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub trade: usize,
    pub cumulative_profit: f64,
    pub equity: f64,
    pub drawdown: f64,
    /// Win rate (percent) over trades `0..=trade`.
    pub running_winrate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub cumulative_profit: f64,
    pub final_equity: f64,
    pub equity_curve: Vec<EquityPoint>,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub loss_streaks: Vec<usize>,
    pub longest_loss_streak: usize,
    pub daily_pnl: Vec<DailyPnl>,
}

impl BacktestMetrics {
    pub fn compute(trades: &[TradeOutcome], capital: f64) -> Self {
        let profits: Vec<f64> = trades.iter().map(|t| t.profit).collect();
        let equity_curve = build_equity_curve(trades, capital);

        let cumulative_profit = profits.iter().sum::<f64>();
        let final_equity = equity_curve.last().map_or(capital, |p| p.equity);
        let max_drawdown = equity_curve.iter().map(|p| p.drawdown).fold(0.0, f64::max);

        let loss_streaks = loss_streaks(trades);
        let longest_loss_streak = loss_streaks.iter().copied().max().unwrap_or(0);

        BacktestMetrics {
            cumulative_profit,
            final_equity,
            equity_curve,
            sharpe_ratio: sharpe_ratio(&profits),
            max_drawdown,
            profit_factor: profit_factor(&profits),
            loss_streaks,
            longest_loss_streak,
            daily_pnl: daily_pnl(trades),
        }
    }
}

fn build_equity_curve(trades: &[TradeOutcome], capital: f64) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(trades.len());
    let mut cumulative = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut wins = 0usize;

    for (i, trade) in trades.iter().enumerate() {
        cumulative += trade.profit;
        let equity = capital + cumulative;
        peak = peak.max(equity);
        if trade.result == TradeResult::Win {
            wins += 1;
        }

        let drawdown = if peak > 0.0 {
            (peak - equity) / peak
        } else {
            0.0
        };

        curve.push(EquityPoint {
            trade: i,
            cumulative_profit: cumulative,
            equity,
            drawdown,
            running_winrate: 100.0 * wins as f64 / (i + 1) as f64,
        });
    }

    curve
}

/// Mean over sample standard deviation of per-trade profit, annualised.
fn sharpe_ratio(profits: &[f64]) -> f64 {
    if profits.len() < 2 {
        return 0.0;
    }
    let n = profits.len() as f64;
    let mean = profits.iter().sum::<f64>() / n;
    let variance = profits.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

fn profit_factor(profits: &[f64]) -> f64 {
    let gains: f64 = profits.iter().filter(|&&p| p > 0.0).sum();
    let losses: f64 = profits.iter().filter(|&&p| p < 0.0).sum();
    if losses != 0.0 {
        gains / losses.abs()
    } else {
        0.0
    }
}

/// Lengths of consecutive loss runs; any win or open trade ends a run.
fn loss_streaks(trades: &[TradeOutcome]) -> Vec<usize> {
    let mut streaks = Vec::new();
    let mut current = 0;
    for trade in trades {
        if trade.result == TradeResult::Loss {
            current += 1;
        } else if current > 0 {
            streaks.push(current);
            current = 0;
        }
    }
    if current > 0 {
        streaks.push(current);
    }
    streaks
}

fn daily_pnl(trades: &[TradeOutcome]) -> Vec<DailyPnl> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        *by_day.entry(trade.closed_at.date()).or_insert(0.0) += trade.profit;
    }
    by_day
        .into_iter()
        .map(|(date, profit)| DailyPnl { date, profit })
        .collect()
}

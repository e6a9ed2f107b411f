//! Grid search over RSI oversold/overbought thresholds.
//!
//! Each entry signal is scored on the spot against its own target, not by
//! scanning forward through the series, so this is a quick screen rather than
//! a backtest.

use serde::{Deserialize, Serialize};

use crate::domain::indicator::{calculate_rsi, rsi};
use crate::domain::ohlcv::{Bar, round_dp};
use crate::domain::strategy::{Side, TradeCandidate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRow {
    pub oversold: u32,
    pub overbought: u32,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub winrate: f64,
    pub total_profit: f64,
}

/// One row per (oversold, overbought) pair with `oversold < overbought`, in
/// oversold-major input order.
pub fn optimize_rsi(bars: &[Bar], oversold: &[u32], overbought: &[u32]) -> Vec<OptimizationRow> {
    let rsi_series = calculate_rsi(bars, rsi::DEFAULT_PERIOD);
    let mut rows = Vec::new();

    for &os in oversold {
        for &ob in overbought {
            if os >= ob {
                log::debug!("optimizer: skipping oversold {} >= overbought {}", os, ob);
                continue;
            }

            let threshold = f64::from(os);
            let mut wins = 0;
            let mut losses = 0;
            let mut profit = 0.0;

            for i in 1..bars.len() {
                let (Some(prev), Some(curr)) = (rsi_series.simple_at(i - 1), rsi_series.simple_at(i))
                else {
                    continue;
                };
                if !(curr > threshold && prev <= threshold) {
                    continue;
                }
                let candidate = TradeCandidate::at_close(Side::Buy, bars[i].close, i);
                if candidate.take_profit > candidate.entry {
                    wins += 1;
                    profit += candidate.take_profit - candidate.entry;
                } else {
                    losses += 1;
                    profit -= candidate.entry - candidate.stop_loss;
                }
            }

            let trades = wins + losses;
            rows.push(OptimizationRow {
                oversold: os,
                overbought: ob,
                trades,
                wins,
                losses,
                winrate: if trades > 0 {
                    100.0 * wins as f64 / trades as f64
                } else {
                    0.0
                },
                total_profit: round_dp(profit, 2),
            });
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    fn swinging() -> Vec<Bar> {
        let mut closes = Vec::new();
        for cycle in 0..4 {
            let base = 100.0 + cycle as f64;
            closes.extend((0..15).map(|i| base - i as f64));
            closes.extend((0..15).map(|i| base - 14.0 + 2.0 * i as f64));
        }
        make_bars(&closes)
    }

    #[test]
    fn skips_inverted_pairs_and_keeps_order() {
        let rows = optimize_rsi(&swinging(), &[25, 70, 30], &[65, 70]);
        let pairs: Vec<(u32, u32)> = rows.iter().map(|r| (r.oversold, r.overbought)).collect();
        assert_eq!(pairs, vec![(25, 65), (25, 70), (30, 65), (30, 70)]);
    }

    #[test]
    fn every_signal_is_a_win() {
        let rows = optimize_rsi(&swinging(), &[30], &[70]);
        let row = &rows[0];
        assert!(row.trades > 0);
        assert_eq!(row.losses, 0);
        assert_eq!(row.wins, row.trades);
        assert_eq!(row.winrate, 100.0);
        assert!(row.total_profit > 0.0);
    }

    #[test]
    fn overbought_does_not_change_results() {
        let rows = optimize_rsi(&swinging(), &[30], &[65, 75]);
        assert_eq!(rows[0].trades, rows[1].trades);
        assert_eq!(rows[0].total_profit, rows[1].total_profit);
    }

    #[test]
    fn total_profit_is_rounded_to_cents() {
        // RSI sits at 0 through the slide and jumps to about 38 on the last bar.
        let mut closes: Vec<f64> = (0..14).map(|i| 100.37 - i as f64).collect();
        closes.push(92.37);
        let rows = optimize_rsi(&make_bars(&closes), &[30], &[70]);

        assert_eq!(rows[0].trades, 1);
        // 2% of 92.37 is 1.8474
        assert_eq!(rows[0].total_profit, 1.85);
    }

    #[test]
    fn empty_inputs() {
        assert!(optimize_rsi(&swinging(), &[], &[70]).is_empty());
        let rows = optimize_rsi(&[], &[30], &[70]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trades, 0);
        assert_eq!(rows[0].winrate, 0.0);
    }
}

//! Support and resistance levels from clustered local extrema.
//!
//! Swing highs and swing lows are snapped onto a price grid. Each grid bucket
//! counts how many extremes landed in it ("touches"); buckets below the last
//! close are support, buckets above it are resistance.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::extrema::{find_peaks, find_troughs};
use crate::domain::ohlcv::{Bar, round_dp};

pub const MAX_LEVELS_PER_SIDE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    /// Minimum bar separation between two extremes of the same kind.
    pub distance: usize,
    /// Price grid used to merge near-identical extremes.
    pub granularity: f64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            distance: 5,
            granularity: 0.0005,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelStrength {
    Weak,
    Moderate,
    Strong,
}

impl LevelStrength {
    pub fn from_touches(touches: usize) -> Self {
        match touches {
            t if t >= 4 => LevelStrength::Strong,
            3 => LevelStrength::Moderate,
            _ => LevelStrength::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    pub strength: LevelStrength,
    pub touches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    /// Nearest first (descending price).
    pub support: Vec<Level>,
    /// Nearest first (ascending price).
    pub resistance: Vec<Level>,
}

impl LevelSet {
    pub fn nearest_support(&self) -> Option<&Level> {
        self.support.first()
    }

    pub fn nearest_resistance(&self) -> Option<&Level> {
        self.resistance.first()
    }
}

pub fn detect_levels(bars: &[Bar], config: &LevelConfig) -> LevelSet {
    let Some(last) = bars.last() else {
        return LevelSet::default();
    };
    if !(config.granularity > 0.0) {
        log::warn!("level granularity {} is not positive", config.granularity);
        return LevelSet::default();
    }

    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let swing_highs = find_peaks(&highs, config.distance);
    let swing_lows = find_troughs(&lows, config.distance);

    let mut buckets: BTreeMap<i64, usize> = BTreeMap::new();
    let extremes = swing_highs
        .iter()
        .map(|&i| highs[i])
        .chain(swing_lows.iter().map(|&i| lows[i]));
    for price in extremes {
        let bucket = (price / config.granularity).round_ties_even() as i64;
        *buckets.entry(bucket).or_insert(0) += 1;
    }

    let levels: Vec<Level> = buckets
        .into_iter()
        .map(|(bucket, touches)| Level {
            price: round_dp(bucket as f64 * config.granularity, 5),
            strength: LevelStrength::from_touches(touches),
            touches,
        })
        .collect();

    let current = last.close;
    // `levels` is ascending by price.
    let support: Vec<Level> = levels
        .iter()
        .rev()
        .filter(|l| l.price < current)
        .take(MAX_LEVELS_PER_SIDE)
        .cloned()
        .collect();
    let resistance: Vec<Level> = levels
        .iter()
        .filter(|l| l.price > current)
        .take(MAX_LEVELS_PER_SIDE)
        .cloned()
        .collect();

    log::debug!(
        "levels: {} swing highs, {} swing lows, {} buckets, {} support, {} resistance",
        swing_highs.len(),
        swing_lows.len(),
        levels.len(),
        support.len(),
        resistance.len()
    );

    LevelSet {
        support,
        resistance,
    }
}

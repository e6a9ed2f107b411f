//! Core domain types and logic.
//!
//! Everything here is a pure function over an in-memory bar series. I/O lives
//! behind the traits in [`crate::ports`].

pub mod ohlcv;
pub mod error;
pub mod indicator;
pub mod extrema;
pub mod levels;
pub mod trend;
pub mod pattern;
pub mod indicator_summary;
pub mod risk;
pub mod strategy;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod optimizer;
pub mod analysis;
pub mod confluence;
pub mod config_validation;

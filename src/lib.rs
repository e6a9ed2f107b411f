//! trendscope: price-structure analysis and strategy backtesting for OHLCV series.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], and the command-line front end in
//! [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;

//! Bar source port trait.

use crate::domain::error::TrendscopeError;
use crate::domain::ohlcv::{Bar, Timeframe};

pub trait DataPort {
    /// Bars for one instrument, oldest first. Implementations reject series
    /// with unparseable values or timestamps that do not strictly increase.
    fn fetch_bars(&self, instrument: &str, timeframe: Timeframe)
        -> Result<Vec<Bar>, TrendscopeError>;

    fn list_instruments(&self, timeframe: Timeframe) -> Result<Vec<String>, TrendscopeError>;
}

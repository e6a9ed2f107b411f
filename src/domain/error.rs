//! Domain error types.
//!
//! Only boundary failures live here. Thin data, sideways markets and skipped
//! optimizer pairs are ordinary results, not errors.

/// Top-level error type for trendscope.
#[derive(Debug, thiserror::Error)]
pub enum TrendscopeError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy: {name}")]
    InvalidStrategy { name: String },

    #[error("unknown timeframe: {name}")]
    InvalidTimeframe { name: String },

    #[error("malformed bar series at row {index}: {reason}")]
    MalformedSeries { index: usize, reason: String },

    #[error("no data for {instrument} at {timeframe}")]
    NoData {
        instrument: String,
        timeframe: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("journal error: {reason}")]
    Journal { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TrendscopeError> for std::process::ExitCode {
    fn from(err: &TrendscopeError) -> Self {
        let code: u8 = match err {
            TrendscopeError::Io(_)
            | TrendscopeError::Json(_)
            | TrendscopeError::Journal { .. }
            | TrendscopeError::Report { .. } => 1,
            TrendscopeError::ConfigParse { .. }
            | TrendscopeError::ConfigMissing { .. }
            | TrendscopeError::ConfigInvalid { .. } => 2,
            TrendscopeError::InvalidStrategy { .. } | TrendscopeError::InvalidTimeframe { .. } => 4,
            TrendscopeError::MalformedSeries { .. }
            | TrendscopeError::NoData { .. }
            | TrendscopeError::DataSource { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

//! Configuration validation.
//!
//! Every key is optional (defaults live on the config structs), but a key that
//! is present must parse and fall in range. The only required key is
//! `[data] directory`.

use crate::domain::error::TrendscopeError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    validate_data(config)?;
    validate_levels(config)?;
    validate_trend(config)?;
    validate_patterns(config)?;
    validate_risk(config)?;
    validate_backtest(config)?;
    validate_optimizer(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TrendscopeError {
    TrendscopeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Present-but-unparseable numbers are errors; `ConfigPort::get_double` would
/// silently fall back to the default.
fn number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, TrendscopeError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| invalid(section, key, format!("'{}' is not a number", raw))),
    }
}

fn integer(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, TrendscopeError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("'{}' is not an integer", raw))),
    }
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    match config.get_string("data", "directory") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TrendscopeError::ConfigMissing {
            section: "data".to_string(),
            key: "directory".to_string(),
        }),
    }
}

fn validate_levels(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    if let Some(distance) = integer(config, "levels", "distance")? {
        if distance < 1 {
            return Err(invalid("levels", "distance", "distance must be at least 1"));
        }
    }
    if let Some(granularity) = number(config, "levels", "granularity")? {
        if granularity <= 0.0 {
            return Err(invalid("levels", "granularity", "granularity must be positive"));
        }
    }
    Ok(())
}

fn validate_trend(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    let short = integer(config, "trend", "short_window")?;
    let long = integer(config, "trend", "long_window")?;
    if short.is_some_and(|v| v < 1) {
        return Err(invalid("trend", "short_window", "short_window must be at least 1"));
    }
    if long.is_some_and(|v| v < 1) {
        return Err(invalid("trend", "long_window", "long_window must be at least 1"));
    }
    let short = short.unwrap_or(20);
    let long = long.unwrap_or(50);
    if short >= long {
        return Err(invalid(
            "trend",
            "short_window",
            "short_window must be less than long_window",
        ));
    }
    Ok(())
}

fn validate_patterns(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    if let Some(threshold) = number(config, "patterns", "threshold")? {
        if threshold <= 0.0 || threshold >= 1.0 {
            return Err(invalid("patterns", "threshold", "threshold must be between 0 and 1"));
        }
    }
    if let Some(distance) = integer(config, "patterns", "min_distance")? {
        if distance < 1 {
            return Err(invalid("patterns", "min_distance", "min_distance must be at least 1"));
        }
    }
    Ok(())
}

fn validate_risk(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    if let Some(capital) = number(config, "risk", "capital")? {
        if capital <= 0.0 {
            return Err(invalid("risk", "capital", "capital must be positive"));
        }
    }
    if let Some(pct) = number(config, "risk", "risk_percent")? {
        if pct <= 0.0 || pct > 100.0 {
            return Err(invalid("risk", "risk_percent", "risk_percent must be in (0, 100]"));
        }
    }
    if let Some(rr) = number(config, "risk", "rr_threshold")? {
        if rr < 0.0 {
            return Err(invalid("risk", "rr_threshold", "rr_threshold must be non-negative"));
        }
    }
    if let Some(slippage) = number(config, "risk", "slippage")? {
        if slippage < 0.0 {
            return Err(invalid("risk", "slippage", "slippage must be non-negative"));
        }
    }
    Ok(())
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    if let Some(capital) = number(config, "backtest", "capital")? {
        if capital <= 0.0 {
            return Err(invalid("backtest", "capital", "capital must be positive"));
        }
    }
    if let Some(name) = config.get_string("backtest", "strategy") {
        name.parse::<StrategyKind>()?;
    }
    Ok(())
}

fn validate_optimizer(config: &dyn ConfigPort) -> Result<(), TrendscopeError> {
    for key in ["oversold", "overbought"] {
        if let Some(raw) = config.get_string("optimizer", key) {
            parse_threshold_list(&raw).map_err(|reason| invalid("optimizer", key, reason))?;
        }
    }
    Ok(())
}

/// Parse a comma-separated list of RSI thresholds (0..=100).
pub fn parse_threshold_list(raw: &str) -> Result<Vec<u32>, String> {
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<u32>() {
            Ok(v) if v <= 100 => Ok(v),
            Ok(v) => Err(format!("threshold {} is above 100", v)),
            Err(_) => Err(format!("'{}' is not a threshold", s)),
        })
        .collect::<Result<Vec<u32>, String>>()?;
    if values.is_empty() {
        return Err("list is empty".to_string());
    }
    Ok(values)
}

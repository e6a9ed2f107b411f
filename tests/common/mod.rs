#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use trendscope::domain::error::TrendscopeError;
pub use trendscope::domain::ohlcv::{Bar, Timeframe};
use trendscope::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<(String, Timeframe), Vec<Bar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, instrument: &str, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.data.insert((instrument.to_string(), timeframe), bars);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, instrument: &str, timeframe: Timeframe) -> Result<Vec<Bar>, TrendscopeError> {
        self.data
            .get(&(instrument.to_string(), timeframe))
            .cloned()
            .ok_or_else(|| TrendscopeError::NoData {
                instrument: instrument.to_string(),
                timeframe: timeframe.to_string(),
            })
    }

    fn list_instruments(&self, timeframe: Timeframe) -> Result<Vec<String>, TrendscopeError> {
        let mut names: Vec<String> = self
            .data
            .keys()
            .filter(|(_, tf)| *tf == timeframe)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Hourly bars with `high = close + spread` and `low = close - spread`.
pub fn bars_from_closes(closes: &[f64], spread: f64) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: start() + Duration::hours(i as i64),
            open: close,
            high: close + spread,
            low: close - spread,
            close,
            volume: 100.0,
        })
        .collect()
}

pub fn make_bar(hour: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: start() + Duration::hours(hour),
        open,
        high,
        low,
        close,
        volume: 100.0,
    }
}

pub fn rising(count: usize, from: f64, step: f64) -> Vec<f64> {
    (0..count).map(|i| from + step * i as f64).collect()
}

/// Falls for `count` bars, then rises for `count` bars, bottoming at `floor`.
pub fn v_shape(count: usize, floor: f64, step: f64) -> Vec<f64> {
    let down = (0..count).map(|i| floor + step * (count - i) as f64);
    let up = (0..count).map(|i| floor + step * i as f64);
    down.chain(up).collect()
}

pub fn write_bars_csv(dir: &Path, instrument: &str, timeframe: Timeframe, bars: &[Bar]) {
    let path = dir.join(format!("{}_{}.csv", instrument, timeframe));
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "Datetime,Open,High,Low,Close,Volume").unwrap();
    for b in bars {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        )
        .unwrap();
    }
}

pub fn write_ini(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("trendscope.ini");
    std::fs::write(&path, content).unwrap();
    path
}

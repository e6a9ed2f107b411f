//! CSV file bar source.
//!
//! Files live at `<base>/<INSTRUMENT>_<TIMEFRAME>.csv`. Headers are matched
//! case-insensitively and need either a `Datetime` column or a `Date` plus
//! `Time` pair, followed by `Open`, `High`, `Low`, `Close` and `Volume` in any
//! order.

use crate::domain::error::TrendscopeError;
use crate::domain::ohlcv::{Bar, Timeframe, validate_series};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, instrument: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", instrument, timeframe))
    }
}

enum TimeColumns {
    Combined(usize),
    Split { date: usize, time: usize },
}

struct Columns {
    time: TimeColumns,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, TrendscopeError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| TrendscopeError::DataSource {
                reason: format!("missing {} column", name),
            })
        };

        let time = match (find("datetime"), find("date"), find("time")) {
            (Some(i), _, _) => TimeColumns::Combined(i),
            (None, Some(date), Some(time)) => TimeColumns::Split { date, time },
            _ => {
                return Err(TrendscopeError::DataSource {
                    reason: "CSV must have Date+Time or Datetime columns".into(),
                });
            }
        };

        Ok(Columns {
            time,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: require("volume")?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_row(record: &csv::StringRecord, cols: &Columns, index: usize) -> Result<Bar, TrendscopeError> {
    let malformed = |reason: String| TrendscopeError::MalformedSeries { index, reason };
    let field = |i: usize, name: &str| {
        record
            .get(i)
            .ok_or_else(|| malformed(format!("missing {} value", name)))
    };
    let number = |i: usize, name: &str| -> Result<f64, TrendscopeError> {
        let raw = field(i, name)?;
        raw.trim()
            .parse::<f64>()
            .map_err(|_| malformed(format!("invalid {} value '{}'", name, raw)))
    };

    let raw_time = match cols.time {
        TimeColumns::Combined(i) => field(i, "datetime")?.to_string(),
        TimeColumns::Split { date, time } => {
            format!("{} {}", field(date, "date")?.trim(), field(time, "time")?.trim())
        }
    };
    let timestamp = parse_timestamp(&raw_time)
        .ok_or_else(|| malformed(format!("invalid timestamp '{}'", raw_time)))?;

    Ok(Bar {
        timestamp,
        open: number(cols.open, "open")?,
        high: number(cols.high, "high")?,
        low: number(cols.low, "low")?,
        close: number(cols.close, "close")?,
        volume: number(cols.volume, "volume")?,
    })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, instrument: &str, timeframe: Timeframe) -> Result<Vec<Bar>, TrendscopeError> {
        let path = self.csv_path(instrument, timeframe);
        let no_data = || TrendscopeError::NoData {
            instrument: instrument.to_string(),
            timeframe: timeframe.to_string(),
        };
        if !path.is_file() {
            return Err(no_data());
        }

        let content = fs::read_to_string(&path).map_err(|e| TrendscopeError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| TrendscopeError::DataSource {
            reason: format!("CSV parse error: {}", e),
        })?;
        let cols = Columns::from_headers(headers)?;

        let mut bars = Vec::new();
        for (index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TrendscopeError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;
            bars.push(parse_row(&record, &cols, index)?);
        }

        if bars.is_empty() {
            return Err(no_data());
        }
        validate_series(&bars)?;

        log::debug!("loaded {} bars from {}", bars.len(), path.display());
        Ok(bars)
    }

    fn list_instruments(&self, timeframe: Timeframe) -> Result<Vec<String>, TrendscopeError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendscopeError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let suffix = format!("_{}.csv", timeframe);
        let mut instruments = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| TrendscopeError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(instrument) = name_str.strip_suffix(&suffix) {
                if !instrument.is_empty() {
                    instruments.push(instrument.to_string());
                }
            }
        }

        instruments.sort();
        Ok(instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "Datetime,Open,High,Low,Close,Volume\n\
            2024-01-15 10:00:00,1.1000,1.1010,1.0990,1.1005,500\n\
            2024-01-15 11:00:00,1.1005,1.1020,1.1000,1.1015,600\n\
            2024-01-15 12:00:00,1.1015,1.1030,1.1010,1.1025,550\n";

        fs::write(path.join("EURUSD_H1.csv"), csv_content).unwrap();
        fs::write(
            path.join("GBPJPY_H1.csv"),
            "date,time,open,high,low,close,volume\n\
             2024-01-15,10:00,190.1,190.5,189.9,190.2,10\n",
        )
        .unwrap();
        fs::write(
            path.join("USDJPY_M15.csv"),
            "Datetime,Open,High,Low,Close,Volume\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_bars_returns_correct_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("EURUSD", Timeframe::H1).unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
        assert_eq!(bars[0].open, 1.1);
        assert_eq!(bars[0].high, 1.101);
        assert_eq!(bars[0].low, 1.099);
        assert_eq!(bars[0].close, 1.1005);
        assert_eq!(bars[0].volume, 500.0);
    }

    #[test]
    fn fetch_bars_accepts_split_date_and_time() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("GBPJPY", Timeframe::H1).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp.format("%H:%M").to_string(), "10:00");
    }

    #[test]
    fn missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_bars("XYZ", Timeframe::H1).unwrap_err();
        assert!(matches!(err, TrendscopeError::NoData { .. }));
    }

    #[test]
    fn header_only_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_bars("USDJPY", Timeframe::M15).unwrap_err();
        assert!(matches!(err, TrendscopeError::NoData { .. }));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD_H1.csv"),
            "Datetime,Open,High,Low,Close,Volume\n\
             2024-01-15 10:00:00,1.1,1.2,1.0,abc,5\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_bars("BAD", Timeframe::H1).unwrap_err();
        assert!(matches!(err, TrendscopeError::MalformedSeries { index: 0, .. }));
    }

    #[test]
    fn out_of_order_rows_are_rejected() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BACK_H1.csv"),
            "Datetime,Open,High,Low,Close,Volume\n\
             2024-01-15 11:00:00,1.1,1.2,1.0,1.1,5\n\
             2024-01-15 10:00:00,1.1,1.2,1.0,1.1,5\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_bars("BACK", Timeframe::H1).unwrap_err();
        assert!(matches!(err, TrendscopeError::MalformedSeries { index: 1, .. }));
    }

    #[test]
    fn missing_time_columns_is_an_error() {
        let (_dir, path) = setup_test_data();
        fs::write(path.join("NOTIME_H1.csv"), "Open,High,Low,Close,Volume\n1,1,1,1,1\n").unwrap();
        let adapter = CsvAdapter::new(path);

        let err = adapter.fetch_bars("NOTIME", Timeframe::H1).unwrap_err();
        assert!(matches!(err, TrendscopeError::DataSource { .. }));
    }

    #[test]
    fn list_instruments_by_timeframe() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(adapter.list_instruments(Timeframe::H1).unwrap(), vec!["EURUSD", "GBPJPY"]);
        assert_eq!(adapter.list_instruments(Timeframe::M15).unwrap(), vec!["USDJPY"]);
        assert!(adapter.list_instruments(Timeframe::D1).unwrap().is_empty());
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-03-01 09:30").is_some());
        assert!(parse_timestamp("2024-03-01T09:30:00").is_some());
        assert!(parse_timestamp("2024.03.01 09:30").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}

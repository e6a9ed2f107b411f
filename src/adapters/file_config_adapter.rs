//! INI file configuration adapter.
//!
//! Section and key lookups are case-insensitive (configparser lowercases both).

use crate::domain::error::TrendscopeError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendscopeError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| TrendscopeError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[data]
directory = ./data
journal = ./trade_journal.csv

[backtest]
capital = 10000
strategy = MA Crossover
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "directory"),
            Some("./data".to_string())
        );
        assert_eq!(
            adapter.get_string("backtest", "strategy"),
            Some("MA Crossover".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[risk]\ncapital = 100\n").unwrap();
        assert_eq!(adapter.get_string("risk", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_values_and_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[levels]\ndistance = 7\nbad = abc\n").unwrap();
        assert_eq!(adapter.get_int("levels", "distance", 0), 7);
        assert_eq!(adapter.get_int("levels", "missing", 42), 42);
        assert_eq!(adapter.get_int("levels", "bad", 42), 42);
    }

    #[test]
    fn get_double_values_and_defaults() {
        let adapter = FileConfigAdapter::from_string(
            "[risk]\nslippage = 0.0002\nrr_threshold = not_a_number\n",
        )
        .unwrap();
        assert_eq!(adapter.get_double("risk", "slippage", 0.0), 0.0002);
        assert_eq!(adapter.get_double("risk", "missing", 99.9), 99.9);
        assert_eq!(adapter.get_double("risk", "rr_threshold", 1.5), 1.5);
    }

    #[test]
    fn keys_are_case_insensitive() {
        let adapter = FileConfigAdapter::from_string("[Risk]\nCapital = 500\n").unwrap();
        assert_eq!(adapter.get_double("risk", "capital", 0.0), 500.0);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[data]\ndirectory = /srv/bars\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("data", "directory"),
            Some("/srv/bars".to_string())
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(matches!(err, TrendscopeError::ConfigParse { .. }));
    }
}

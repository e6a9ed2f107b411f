//! Append-only CSV trade journal.

use std::fs::OpenOptions;
use std::path::PathBuf;

use crate::domain::error::TrendscopeError;
use crate::ports::journal_port::{JournalEntry, JournalPort};

pub const JOURNAL_HEADER: [&str; 8] = [
    "Strategy",
    "Entry",
    "SL",
    "TP",
    "Result",
    "RR",
    "Date",
    "Screenshot",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub struct CsvJournalAdapter {
    path: PathBuf,
}

impl CsvJournalAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn journal_error(&self, e: impl std::fmt::Display) -> TrendscopeError {
        TrendscopeError::Journal {
            reason: format!("{}: {}", self.path.display(), e),
        }
    }
}

impl JournalPort for CsvJournalAdapter {
    fn append(&self, entries: &[JournalEntry]) -> Result<(), TrendscopeError> {
        let is_new = self
            .path
            .metadata()
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.journal_error(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer
                .write_record(JOURNAL_HEADER)
                .map_err(|e| self.journal_error(e))?;
        }

        for entry in entries {
            writer
                .write_record([
                    entry.strategy.clone(),
                    entry.entry.to_string(),
                    entry.stop_loss.to_string(),
                    entry.take_profit.to_string(),
                    entry.result.clone(),
                    entry.risk_reward.to_string(),
                    entry.date.format(DATE_FORMAT).to_string(),
                    entry.screenshot.clone().unwrap_or_default(),
                ])
                .map_err(|e| self.journal_error(e))?;
        }

        writer.flush().map_err(|e| self.journal_error(e))?;
        log::debug!("appended {} journal rows to {}", entries.len(), self.path.display());
        Ok(())
    }
}

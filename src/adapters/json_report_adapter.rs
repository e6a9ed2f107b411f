//! Pretty-printed JSON report writer.

use serde::Serialize;
use std::fs;

use crate::domain::analysis::AnalysisSummary;
use crate::domain::backtest::BacktestResult;
use crate::domain::confluence::Confluence;
use crate::domain::error::TrendscopeError;
use crate::domain::metrics::BacktestMetrics;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct BacktestReport<'a> {
    result: &'a BacktestResult,
    metrics: &'a BacktestMetrics,
}

#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        JsonReportAdapter
    }

    fn write<T: Serialize>(&self, value: &T, output_path: &str) -> Result<(), TrendscopeError> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(output_path, json).map_err(|e| TrendscopeError::Report {
            reason: format!("failed to write {}: {}", output_path, e),
        })?;
        log::info!("report written to {}", output_path);
        Ok(())
    }
}

impl ReportPort for JsonReportAdapter {
    fn write_analysis(
        &self,
        summary: &AnalysisSummary,
        output_path: &str,
    ) -> Result<(), TrendscopeError> {
        self.write(summary, output_path)
    }

    fn write_backtest(
        &self,
        result: &BacktestResult,
        metrics: &BacktestMetrics,
        output_path: &str,
    ) -> Result<(), TrendscopeError> {
        self.write(&BacktestReport { result, metrics }, output_path)
    }

    fn write_confluence(
        &self,
        confluence: &Confluence,
        output_path: &str,
    ) -> Result<(), TrendscopeError> {
        self.write(confluence, output_path)
    }
}

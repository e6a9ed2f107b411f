//! Report sink port trait.

use crate::domain::analysis::AnalysisSummary;
use crate::domain::backtest::BacktestResult;
use crate::domain::confluence::Confluence;
use crate::domain::error::TrendscopeError;
use crate::domain::metrics::BacktestMetrics;

/// Port for writing analysis and backtest reports.
pub trait ReportPort {
    fn write_analysis(
        &self,
        summary: &AnalysisSummary,
        output_path: &str,
    ) -> Result<(), TrendscopeError>;

    fn write_backtest(
        &self,
        result: &BacktestResult,
        metrics: &BacktestMetrics,
        output_path: &str,
    ) -> Result<(), TrendscopeError>;

    fn write_confluence(
        &self,
        confluence: &Confluence,
        output_path: &str,
    ) -> Result<(), TrendscopeError>;
}

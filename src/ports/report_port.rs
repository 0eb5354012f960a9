//! Report output port traits.

use std::path::PathBuf;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::SigtraderError;

/// Durable sink for a finished run's report.
pub trait ReportPort {
    /// Store `report`, returning where it went.
    fn log(&self, report: &BacktestReport) -> Result<PathBuf, SigtraderError>;
}

/// Export of the per-step signal table and balance curve for plotting.
pub trait SignalExportPort {
    fn export(&self, report: &BacktestReport) -> Result<(), SigtraderError>;
}

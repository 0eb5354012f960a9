//! CSV export of the per-step signal table and balance curve.

use std::path::PathBuf;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::SigtraderError;
use crate::ports::report_port::SignalExportPort;

pub struct SignalCsvAdapter {
    path: PathBuf,
}

impl SignalCsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SignalExportPort for SignalCsvAdapter {
    fn export(&self, report: &BacktestReport) -> Result<(), SigtraderError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut wtr = csv::Writer::from_path(&self.path)?;

        let generators: Vec<&str> = report
            .signals
            .first()
            .map(|row| row.generator_signals.iter().map(|(n, _)| n.as_str()).collect())
            .unwrap_or_default();

        let mut header = vec!["date", "close"];
        header.extend(generators.iter().copied());
        header.extend(["signal", "balance", "open_value"]);
        wtr.write_record(&header)?;

        for (row, point) in report.signals.iter().zip(&report.balance_curve) {
            let mut record = vec![row.date.to_string(), row.close.to_string()];
            record.extend(row.generator_signals.iter().map(|(_, s)| s.to_string()));
            record.push(row.signal.to_string());
            record.push(format!("{:.2}", point.balance));
            record.push(format!("{:.2}", point.open_value));
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

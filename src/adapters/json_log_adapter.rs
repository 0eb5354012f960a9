//! JSON run log adapter implementing ReportPort.
//!
//! One file per run, `log_<YYYY-mm-dd_HH-MM-SS_micros>.json`, holding the
//! balance, profit, open exposure and the closed-trade history. An existing
//! log is never overwritten.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::backtest::BacktestReport;
use crate::domain::error::SigtraderError;
use crate::domain::operation::{round2, TradeSummary};
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
struct Balance {
    #[serde(rename = "Initial")]
    initial: f64,
    #[serde(rename = "Final")]
    final_: f64,
}

#[derive(Serialize)]
struct Profit {
    #[serde(rename = "Total (R$)")]
    total: f64,
    #[serde(rename = "Total (%)")]
    total_pct: String,
}

#[derive(Serialize)]
struct Active {
    #[serde(rename = "Total(#)")]
    count: usize,
    #[serde(rename = "Total(R$)")]
    value: f64,
}

#[derive(Serialize)]
struct Operations<'a> {
    #[serde(rename = "Total")]
    total: usize,
    #[serde(rename = "Total closed")]
    closed: usize,
    #[serde(rename = "Success")]
    success: usize,
    #[serde(rename = "Fail")]
    fail: usize,
    #[serde(rename = "History")]
    history: &'a [TradeSummary],
}

#[derive(Serialize)]
struct RunLog<'a> {
    #[serde(rename = "Agent")]
    agent: &'a str,
    #[serde(rename = "Used on")]
    used_on: &'a str,
    #[serde(rename = "Initial date")]
    initial_date: NaiveDate,
    #[serde(rename = "Final date")]
    final_date: NaiveDate,
    #[serde(rename = "Balance")]
    balance: Balance,
    #[serde(rename = "Profit")]
    profit: Profit,
    #[serde(rename = "Active")]
    active: Active,
    #[serde(rename = "Operations")]
    operations: Operations<'a>,
}

impl<'a> From<&'a BacktestReport> for RunLog<'a> {
    fn from(report: &'a BacktestReport) -> Self {
        RunLog {
            agent: &report.runner,
            used_on: &report.used_on,
            initial_date: report.initial_date,
            final_date: report.final_date,
            balance: Balance {
                initial: round2(report.initial_balance),
                final_: round2(report.final_balance),
            },
            profit: Profit {
                total: round2(report.profit),
                total_pct: format!("{} %", round2(report.profit_pct * 100.0)),
            },
            active: Active {
                count: report.active_count,
                value: round2(report.active_value),
            },
            operations: Operations {
                total: report.total_operations,
                closed: report.closed_operations,
                success: report.successes,
                fail: report.failures,
                history: &report.history,
            },
        }
    }
}

pub struct JsonLogAdapter {
    dir: PathBuf,
    timestamp: NaiveDateTime,
}

impl JsonLogAdapter {
    /// Log into `dir`, stamped with the local time at construction.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_timestamp(dir, Local::now().naive_local())
    }

    pub fn with_timestamp<P: AsRef<Path>>(dir: P, timestamp: NaiveDateTime) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            timestamp,
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.numbered_path(0)
    }

    fn numbered_path(&self, n: u32) -> PathBuf {
        let stamp = self.timestamp.format("%Y-%m-%d_%H-%M-%S_%6f");
        if n == 0 {
            self.dir.join(format!("log_{stamp}.json"))
        } else {
            self.dir.join(format!("log_{stamp}-{n}.json"))
        }
    }
}

impl ReportPort for JsonLogAdapter {
    fn log(&self, report: &BacktestReport) -> Result<PathBuf, SigtraderError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(&RunLog::from(report))?;

        let mut n = 0;
        loop {
            let path = self.numbered_path(n);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

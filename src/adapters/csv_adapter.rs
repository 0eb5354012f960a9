//! CSV file price adapter.
//!
//! Reads `<base_path>/<SYMBOL>.csv`. Columns are located by header name, so
//! both minimal `date,close` files and full OHLCV exports load.

use crate::domain::error::SigtraderError;
use crate::domain::price::PriceSeries;
use crate::ports::data_port::{require_range, DataPort};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const CLOSE_HEADERS: [&str; 3] = ["close", "adj close", "adj_close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

impl DataPort for CsvAdapter {
    fn fetch_closes(
        &self,
        symbol: &str,
        initial_date: Option<NaiveDate>,
        final_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SigtraderError> {
        let (start, end) = require_range(initial_date, final_date)?;

        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            SigtraderError::data(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers()?.clone();
        let date_col = column(&headers, &["date"])
            .ok_or_else(|| SigtraderError::data(format!("{}: missing date column", path.display())))?;
        let close_col = column(&headers, &CLOSE_HEADERS).ok_or_else(|| {
            SigtraderError::data(format!("{}: missing close column", path.display()))
        })?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;

            let date_str = record.get(date_col).unwrap_or_default().trim();
            // Accept both `2020-01-02` and `2020-01-02 00:00:00`.
            let date = NaiveDate::parse_from_str(date_str.get(..10).unwrap_or(date_str), "%Y-%m-%d")
                .map_err(|e| SigtraderError::data(format!("invalid date '{}': {}", date_str, e)))?;

            if date < start || date > end {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default().trim();
            let close: f64 = close_str.parse().map_err(|e| {
                SigtraderError::data(format!("invalid close value '{}': {}", close_str, e))
            })?;

            rows.push((date, close));
        }

        if rows.is_empty() {
            return Err(SigtraderError::NoData {
                symbol: symbol.to_string(),
            });
        }

        rows.sort_by_key(|(date, _)| *date);
        PriceSeries::from_closes(rows)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            SigtraderError::data(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#![allow(dead_code)]

use chrono::NaiveDate;
use sigtrader::domain::backtest::BacktestConfig;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::generator::{IndicatorColumns, SignalGenerator, SignalPoint};
use sigtrader::domain::ledger::LedgerConfig;
use sigtrader::domain::price::{PriceBar, PriceSeries};
use sigtrader::domain::signal::Signal;
use sigtrader::ports::data_port::{require_range, DataPort};
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<(NaiveDate, f64)>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, symbol: &str, closes: Vec<(NaiveDate, f64)>) -> Self {
        self.data.insert(symbol.to_string(), closes);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_closes(
        &self,
        symbol: &str,
        initial_date: Option<NaiveDate>,
        final_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SigtraderError> {
        let (start, end) = require_range(initial_date, final_date)?;
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SigtraderError::data(reason.clone()));
        }
        let rows: Vec<(NaiveDate, f64)> = self
            .data
            .get(symbol)
            .map(|rows| {
                rows.iter()
                    .copied()
                    .filter(|(d, _)| *d >= start && *d <= end)
                    .collect()
            })
            .unwrap_or_default();
        if rows.is_empty() {
            return Err(SigtraderError::NoData {
                symbol: symbol.to_string(),
            });
        }
        PriceSeries::from_closes(rows)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Emits `script[i]` at bar `i`, DoNothing past the end.
pub struct ScriptedGenerator {
    name: String,
    script: Vec<Signal>,
    points: Option<Vec<SignalPoint>>,
}

impl ScriptedGenerator {
    pub fn boxed(name: &str, script: &[Signal]) -> Box<dyn SignalGenerator> {
        Box::new(ScriptedGenerator {
            name: name.to_string(),
            script: script.to_vec(),
            points: None,
        })
    }
}

impl SignalGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn update(&mut self, bars: &[PriceBar]) {
        self.points = Some(
            bars.iter()
                .enumerate()
                .map(|(i, bar)| SignalPoint {
                    date: bar.date,
                    close: bar.close,
                    pct_change: bar.pct_change,
                    signal: self.script.get(i).copied().unwrap_or_default(),
                    columns: IndicatorColumns::None,
                })
                .collect(),
        );
    }

    fn signals(&self) -> Result<&[SignalPoint], SigtraderError> {
        self.points
            .as_deref()
            .ok_or_else(|| SigtraderError::NotComputed {
                generator: self.name.clone(),
            })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily closes starting at `start`.
pub fn daily_closes(start: &str, closes: &[f64]) -> Vec<(NaiveDate, f64)> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| (start + chrono::Duration::days(i as i64), c))
        .collect()
}

pub fn series(start: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::from_closes(daily_closes(start, closes)).unwrap()
}

/// Flat, then a step up, then a step down: one golden cross and one death cross
/// for short windows.
pub fn step_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 10];
    closes.extend(std::iter::repeat(110.0).take(10));
    closes.extend(std::iter::repeat(95.0).take(10));
    closes
}

pub fn sample_config(symbol: &str) -> BacktestConfig {
    BacktestConfig {
        symbol: symbol.to_string(),
        initial_date: Some(date(2024, 1, 1)),
        final_date: Some(date(2024, 12, 31)),
        ledger: LedgerConfig::default(),
    }
}

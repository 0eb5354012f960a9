//! Backtest driver: causal prefix sweep and the final report.
//!
//! The driver feeds `bars[0..i]` for `i = 1..=N`, so no decision at bar `i`
//! can observe a later bar.

use chrono::NaiveDate;
use tracing::info;

use super::agent::{Agent, SignalRow};
use super::error::SigtraderError;
use super::generator::SignalGenerator;
use super::ledger::{BalancePoint, Ledger, LedgerConfig};
use super::operation::{TradeResult, TradeSummary};
use super::price::{PriceBar, PriceSeries};
use super::signal::Signal;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub symbol: String,
    pub initial_date: Option<NaiveDate>,
    pub final_date: Option<NaiveDate>,
    pub ledger: LedgerConfig,
}

/// Anything that can be walked forward over a price series.
pub trait Runnable {
    fn name(&self) -> &str;

    /// Process one causal prefix and return the decision at its last bar.
    fn step(&mut self, prefix: &[PriceBar]) -> Result<Signal, SigtraderError>;

    fn ledger(&self) -> &Ledger;

    fn signals(&self) -> &[SignalRow];

    /// Sweep every prefix of `series` and report on `symbol`.
    fn run(&mut self, series: &PriceSeries, symbol: &str) -> Result<BacktestReport, SigtraderError> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Err(SigtraderError::NoData {
                symbol: symbol.to_string(),
            });
        };

        info!(
            runner = self.name(),
            symbol,
            bars = series.len(),
            "running backtest"
        );
        for i in 1..=series.len() {
            self.step(series.prefix(i))?;
        }

        let report = BacktestReport::build(
            self.name(),
            symbol,
            first.date,
            last.date,
            last.close,
            self.ledger(),
            self.signals(),
        );
        info!(
            runner = self.name(),
            symbol,
            final_balance = report.final_balance,
            closed = report.closed_operations,
            "backtest finished"
        );
        Ok(report)
    }
}

impl Runnable for Agent {
    fn name(&self) -> &str {
        Agent::name(self)
    }

    fn step(&mut self, prefix: &[PriceBar]) -> Result<Signal, SigtraderError> {
        self.update(prefix)
    }

    fn ledger(&self) -> &Ledger {
        Agent::ledger(self)
    }

    fn signals(&self) -> &[SignalRow] {
        Agent::signals(self)
    }
}

/// A single generator trading on its own signal, without aggregation.
pub struct ModelRunner {
    inner: Agent,
}

impl ModelRunner {
    pub fn new(
        generator: Box<dyn SignalGenerator>,
        config: LedgerConfig,
    ) -> Result<Self, SigtraderError> {
        let mut inner = Agent::new(generator.name().to_string(), config);
        inner.add_generator(generator)?;
        Ok(ModelRunner { inner })
    }
}

impl Runnable for ModelRunner {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn step(&mut self, prefix: &[PriceBar]) -> Result<Signal, SigtraderError> {
        self.inner.update(prefix)
    }

    fn ledger(&self) -> &Ledger {
        self.inner.ledger()
    }

    fn signals(&self) -> &[SignalRow] {
        self.inner.signals()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub runner: String,
    pub used_on: String,
    pub initial_date: NaiveDate,
    pub final_date: NaiveDate,
    pub initial_balance: f64,
    pub final_balance: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub active_count: usize,
    pub active_value: f64,
    pub total_operations: usize,
    pub closed_operations: usize,
    pub successes: usize,
    pub failures: usize,
    pub history: Vec<TradeSummary>,
    pub signals: Vec<SignalRow>,
    pub balance_curve: Vec<BalancePoint>,
}

impl BacktestReport {
    pub fn build(
        runner: &str,
        used_on: &str,
        initial_date: NaiveDate,
        final_date: NaiveDate,
        last_price: f64,
        ledger: &Ledger,
        signals: &[SignalRow],
    ) -> Self {
        let history = ledger.history();
        let (active_count, active_value) = ledger.active_operation_data(last_price);
        let successes = history
            .trades
            .iter()
            .filter(|t| t.result == TradeResult::Success)
            .count();

        BacktestReport {
            runner: runner.to_string(),
            used_on: used_on.to_string(),
            initial_date,
            final_date,
            initial_balance: ledger.initial_balance(),
            final_balance: ledger.balance(),
            profit: history.profit,
            profit_pct: history.profit_pct,
            active_count,
            active_value,
            total_operations: ledger.operations().len(),
            closed_operations: history.trades.len(),
            successes,
            failures: history.trades.len() - successes,
            history: history.trades.to_vec(),
            signals: signals.to_vec(),
            balance_curve: ledger.balance_curve().to_vec(),
        }
    }
}

/// Fetch the configured range through `data` and run `runnable` over it.
pub fn run_backtest(
    data: &dyn DataPort,
    runnable: &mut dyn Runnable,
    config: &BacktestConfig,
) -> Result<BacktestReport, SigtraderError> {
    let series = data.fetch_closes(&config.symbol, config.initial_date, config.final_date)?;
    let mut report = runnable.run(&series, &config.symbol)?;

    if let Some(date) = config.initial_date {
        report.initial_date = date;
    }
    if let Some(date) = config.final_date {
        report.final_date = date;
    }
    Ok(report)
}

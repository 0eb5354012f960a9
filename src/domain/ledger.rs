//! Cash balance, operations and closed-trade history for one agent.
//!
//! Each step runs the close check before the open check, so an operation
//! opened on a bar is first evaluated on the following bar.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::SigtraderError;
use super::operation::{round2, Operation, Position, TradeSummary};
use super::price::PriceBar;
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerConfig {
    pub initial_balance: f64,
    /// Share of the current balance committed to each new operation.
    pub active_balance_fraction: f64,
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            initial_balance: 1000.0,
            active_balance_fraction: 0.1,
            take_profit_pct: 0.03,
            stop_loss_pct: 0.01,
        }
    }
}

impl LedgerConfig {
    /// Checks used by the config layer. The ledger itself does not call this:
    /// a fraction of 1 or more is accepted and can drive the balance negative.
    pub fn validate(&self) -> Result<(), SigtraderError> {
        if !(self.initial_balance > 0.0) {
            return Err(SigtraderError::configuration(
                "initial balance must be positive",
            ));
        }
        if !(self.active_balance_fraction > 0.0 && self.active_balance_fraction < 1.0) {
            return Err(SigtraderError::configuration(
                "active balance fraction must be between 0 and 1 (exclusive)",
            ));
        }
        if !(0.0..1.0).contains(&self.take_profit_pct) {
            return Err(SigtraderError::configuration(
                "take profit must be in [0, 1)",
            ));
        }
        if !(0.0..1.0).contains(&self.stop_loss_pct) {
            return Err(SigtraderError::configuration("stop loss must be in [0, 1)"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: f64,
    /// Mark-to-market value of open operations at this step's close.
    pub open_value: f64,
}

/// What happened to the ledger during one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub closed: Vec<u64>,
    pub opened: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct History<'a> {
    pub profit: f64,
    pub profit_pct: f64,
    pub trades: &'a [TradeSummary],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    config: LedgerConfig,
    balance: f64,
    operations: Vec<Operation>,
    history: Vec<TradeSummary>,
    balance_curve: Vec<BalancePoint>,
    next_id: u64,
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Ledger {
            config,
            balance: config.initial_balance,
            operations: Vec::new(),
            history: Vec::new(),
            balance_curve: Vec::new(),
            next_id: 0,
        }
    }

    pub fn initial_balance(&self) -> f64 {
        self.config.initial_balance
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// All operations in creation order, open and closed.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn open_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.is_open())
    }

    pub fn balance_curve(&self) -> &[BalancePoint] {
        &self.balance_curve
    }

    /// Apply the close check then the open check for one bar.
    pub fn step(&mut self, bar: &PriceBar, signal: Signal) -> Result<StepOutcome, SigtraderError> {
        let mut outcome = StepOutcome::default();

        for op in self.operations.iter_mut().filter(|op| op.is_open()) {
            if !op.reached_endpoint(bar.close) {
                continue;
            }
            let closure = op.close(bar.date)?;
            self.balance += closure.invested_value + closure.profit;
            debug!(
                id = op.id(),
                date = %bar.date,
                price = bar.close,
                profit = closure.profit,
                balance = self.balance,
                "closed operation"
            );
            outcome.closed.push(op.id());
            self.history.push(closure.summary);
        }

        if let Some(position) = Position::from_signal(signal) {
            outcome.opened = Some(self.open(position, bar)?);
        }

        let open_value = self.open_value(bar.close);
        self.balance_curve.push(BalancePoint {
            date: bar.date,
            balance: self.balance,
            open_value,
        });

        Ok(outcome)
    }

    fn open(&mut self, position: Position, bar: &PriceBar) -> Result<u64, SigtraderError> {
        let mut invested_value = round2(self.balance * self.config.active_balance_fraction);
        // A drained balance still opens, with nothing at stake.
        if invested_value < 0.0 {
            warn!(
                date = %bar.date,
                balance = self.balance,
                "balance is negative, opening with zero invested"
            );
            invested_value = 0.0;
        }
        let op = Operation::new(
            self.next_id,
            position,
            bar.close,
            invested_value,
            self.config.take_profit_pct,
            self.config.stop_loss_pct,
            bar.date,
        )?;

        let id = op.id();
        self.next_id += 1;
        self.balance -= invested_value;
        debug!(
            id,
            %position,
            date = %bar.date,
            price = bar.close,
            invested_value,
            balance = self.balance,
            "opened operation"
        );
        self.operations.push(op);
        Ok(id)
    }

    fn open_value(&self, price: f64) -> f64 {
        self.open_operations().map(|op| op.cash_open(price)).sum()
    }

    /// Realized profit over closed operations, absolute and relative to the
    /// initial balance.
    pub fn history(&self) -> History<'_> {
        let profit: f64 = self
            .operations
            .iter()
            .filter_map(|op| op.profit())
            .sum();
        History {
            profit,
            profit_pct: profit / self.config.initial_balance,
            trades: &self.history,
        }
    }

    /// (open operation count, their mark-to-market value at `price`).
    pub fn active_operation_data(&self, price: f64) -> (usize, f64) {
        (self.open_operations().count(), self.open_value(price))
    }

    /// Sum of invested value still committed to open operations.
    pub fn invested_in_flight(&self) -> f64 {
        self.open_operations().map(|op| op.invested_value()).sum()
    }
}

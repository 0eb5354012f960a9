//! Simulated positions and their open → closed lifecycle.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

use super::error::SigtraderError;
use super::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Position {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

impl Position {
    pub fn from_signal(signal: Signal) -> Option<Self> {
        match signal {
            Signal::Buy => Some(Position::Buy),
            Signal::Sell => Some(Position::Sell),
            Signal::DoNothing => None,
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Position::Buy => 1.0,
            Position::Sell => -1.0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Buy => write!(f, "BUY"),
            Position::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeResult {
    Success,
    Fail,
}

/// Frozen record of a closed operation, as appended to the ledger history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSummary {
    #[serde(rename = "Operation id")]
    pub operation_id: u64,
    #[serde(rename = "Result")]
    pub result: TradeResult,
    #[serde(rename = "Entered as")]
    pub position: Position,
    #[serde(rename = "Profit (R$)")]
    pub profit: f64,
    #[serde(rename = "Profit (%)", serialize_with = "percent_string")]
    pub profit_pct: f64,
    #[serde(rename = "Invested value (R$)")]
    pub invested_value: f64,
    #[serde(rename = "Initial close price (R$)")]
    pub entry_price: f64,
    #[serde(rename = "Final close price (R$)")]
    pub exit_price: f64,
    #[serde(rename = "Initial date")]
    pub entry_date: NaiveDate,
    #[serde(rename = "Final date")]
    pub exit_date: NaiveDate,
}

fn percent_string<S: Serializer>(pct: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{} %", round2(pct * 100.0)))
}

/// What the ledger needs back from a close.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub invested_value: f64,
    pub profit: f64,
    pub summary: TradeSummary,
}

/// Round to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    id: u64,
    position: Position,
    entry_price: f64,
    invested_value: f64,
    take_profit_pct: f64,
    stop_loss_pct: f64,
    entry_date: NaiveDate,
    // Last price that satisfied `reached_endpoint`; becomes final on close.
    exit_candidate: Option<f64>,
    final_price: Option<f64>,
    exit_date: Option<NaiveDate>,
    profit: Option<f64>,
}

impl Operation {
    pub fn new(
        id: u64,
        position: Position,
        entry_price: f64,
        invested_value: f64,
        take_profit_pct: f64,
        stop_loss_pct: f64,
        entry_date: NaiveDate,
    ) -> Result<Self, SigtraderError> {
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(SigtraderError::configuration(format!(
                "entry price must be positive, got {entry_price}"
            )));
        }
        if !invested_value.is_finite() || invested_value < 0.0 {
            return Err(SigtraderError::configuration(format!(
                "invested value must be non-negative, got {invested_value}"
            )));
        }

        Ok(Self {
            id,
            position,
            entry_price,
            invested_value,
            take_profit_pct,
            stop_loss_pct,
            entry_date,
            exit_candidate: None,
            final_price: None,
            exit_date: None,
            profit: None,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn invested_value(&self) -> f64 {
        self.invested_value
    }

    pub fn entry_date(&self) -> NaiveDate {
        self.entry_date
    }

    pub fn final_price(&self) -> Option<f64> {
        self.final_price
    }

    pub fn exit_date(&self) -> Option<NaiveDate> {
        self.exit_date
    }

    /// Realized profit; `None` while open.
    pub fn profit(&self) -> Option<f64> {
        self.profit
    }

    pub fn state(&self) -> OperationState {
        if self.final_price.is_some() {
            OperationState::Closed
        } else {
            OperationState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == OperationState::Open
    }

    /// (take-profit price, stop-loss price) for this position.
    pub fn thresholds(&self) -> (f64, f64) {
        match self.position {
            Position::Buy => (
                self.entry_price * (1.0 + self.take_profit_pct),
                self.entry_price * (1.0 - self.stop_loss_pct),
            ),
            Position::Sell => (
                self.entry_price * (1.0 - self.take_profit_pct),
                self.entry_price * (1.0 + self.stop_loss_pct),
            ),
        }
    }

    /// Whether `price` crosses the take-profit or stop-loss threshold.
    /// Remembers `price` as the exit price when it does. Never true once closed.
    pub fn reached_endpoint(&mut self, price: f64) -> bool {
        if !self.is_open() {
            return false;
        }

        let (take_profit, stop_loss) = self.thresholds();
        let reached = match self.position {
            Position::Buy => price > take_profit || price < stop_loss,
            Position::Sell => price < take_profit || price > stop_loss,
        };

        if reached {
            self.exit_candidate = Some(price);
        }
        reached
    }

    /// Signed return of `price` relative to entry.
    pub fn return_pct(&self, price: f64) -> f64 {
        self.position.sign() * (price - self.entry_price) / self.entry_price
    }

    /// Mark-to-market value of the invested amount at `price`.
    pub fn cash_open(&self, price: f64) -> f64 {
        self.invested_value * (1.0 + self.return_pct(price))
    }

    pub fn close(&mut self, exit_date: NaiveDate) -> Result<Closure, SigtraderError> {
        if !self.is_open() {
            return Err(SigtraderError::AlreadyClosed { id: self.id });
        }

        let final_price = self.exit_candidate.unwrap_or(self.entry_price);
        let profit_pct = self.return_pct(final_price);
        let profit = self.invested_value * profit_pct;

        self.final_price = Some(final_price);
        self.exit_date = Some(exit_date);
        self.profit = Some(profit);

        let result = if (final_price - self.entry_price) * self.position.sign() > 0.0 {
            TradeResult::Success
        } else {
            TradeResult::Fail
        };

        Ok(Closure {
            invested_value: self.invested_value,
            profit,
            summary: TradeSummary {
                operation_id: self.id,
                result,
                position: self.position,
                profit: round2(profit),
                profit_pct,
                invested_value: self.invested_value,
                entry_price: self.entry_price,
                exit_price: final_price,
                entry_date: self.entry_date,
                exit_date,
            },
        })
    }
}

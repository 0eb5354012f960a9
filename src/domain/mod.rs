//! Core domain types and logic.

pub mod price;
pub mod signal;
pub mod indicator;
pub mod generator;
pub mod operation;
pub mod ledger;
pub mod agent;
pub mod backtest;
pub mod config_validation;
pub mod error;

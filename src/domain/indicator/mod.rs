//! Moving averages over closing prices.
//!
//! - `IndicatorPoint`: one dated value, flagged invalid during warm-up
//! - `IndicatorType`: indicator identity and window
//! - `IndicatorSeries`: a time series aligned one-to-one with the input bars

pub mod ema;
pub mod sma;

use chrono::NaiveDate;
use std::fmt;

use crate::domain::price::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
}

impl IndicatorType {
    pub fn calculate(&self, bars: &[PriceBar]) -> IndicatorSeries {
        match *self {
            IndicatorType::Sma(period) => sma::calculate_sma(bars, period),
            IndicatorType::Ema(period) => ema::calculate_ema(bars, period),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at `index`, or `None` while the indicator is still warming up.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
        }
    }
}

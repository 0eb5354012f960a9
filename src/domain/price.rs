//! Daily close bars and the append-only series they form.

use chrono::NaiveDate;
use serde::Serialize;

use super::error::SigtraderError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
    /// Change relative to the previous bar's close; 0.0 for the first bar.
    pub pct_change: f64,
}

/// Strictly date-ordered sequence of bars. Bars are never modified once pushed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_closes<I>(closes: I) -> Result<Self, SigtraderError>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut series = Self::new();
        for (date, close) in closes {
            series.push(date, close)?;
        }
        Ok(series)
    }

    pub fn push(&mut self, date: NaiveDate, close: f64) -> Result<&PriceBar, SigtraderError> {
        if !close.is_finite() || close <= 0.0 {
            return Err(SigtraderError::data(format!(
                "invalid close {close} on {date}"
            )));
        }

        let pct_change = match self.bars.last() {
            Some(prev) if date <= prev.date => {
                return Err(SigtraderError::data(format!(
                    "bar dated {date} does not follow {}",
                    prev.date
                )));
            }
            Some(prev) => (close - prev.close) / prev.close,
            None => 0.0,
        };

        self.bars.push(PriceBar {
            date,
            close,
            pct_change,
        });
        Ok(&self.bars[self.bars.len() - 1])
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// The first `len` bars, clamped to the series length.
    pub fn prefix(&self, len: usize) -> &[PriceBar] {
        &self.bars[..len.min(self.bars.len())]
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

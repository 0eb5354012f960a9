//! Price data access port trait.

use chrono::NaiveDate;

use crate::domain::error::SigtraderError;
use crate::domain::price::PriceSeries;

pub trait DataPort {
    /// Daily closes for `symbol` within `[initial_date, final_date]`.
    ///
    /// Both bounds are required; a missing one fails with `MissingDateRange`.
    fn fetch_closes(
        &self,
        symbol: &str,
        initial_date: Option<NaiveDate>,
        final_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SigtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;
}

/// Unwrap both bounds of a date range, initial first.
pub fn require_range(
    initial_date: Option<NaiveDate>,
    final_date: Option<NaiveDate>,
) -> Result<(NaiveDate, NaiveDate), SigtraderError> {
    let initial = initial_date.ok_or(SigtraderError::MissingDateRange { bound: "Initial" })?;
    let last = final_date.ok_or(SigtraderError::MissingDateRange { bound: "Final" })?;
    Ok((initial, last))
}

//! Signal generators: per-bar Buy/Sell/DoNothing producers.
//!
//! A generator is recomputed from scratch on every `update` so that the
//! column it exposes depends only on the prefix it was given.

pub mod ma_crossover;
pub mod parse;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::SigtraderError;
use crate::domain::price::PriceBar;
use crate::domain::signal::Signal;

pub use ma_crossover::{MaCrossover, MaKind};
pub use parse::{parse_generators, GeneratorSpec};

/// Indicator values a generator exposes next to its signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum IndicatorColumns {
    None,
    Crossover {
        fast: f64,
        slow: f64,
        fast_above: bool,
    },
}

/// One row of a generator's output, aligned to an input bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub pct_change: f64,
    pub signal: Signal,
    pub columns: IndicatorColumns,
}

pub trait SignalGenerator: Send {
    /// Unique name within an agent; derived from parameters.
    fn name(&self) -> &str;

    /// Bars needed before the generator can emit anything but DoNothing.
    fn warmup_bars(&self) -> usize;

    /// Recompute the signal column for `bars`, replacing any previous output.
    fn update(&mut self, bars: &[PriceBar]);

    /// Output of the last `update`, one point per input bar.
    fn signals(&self) -> Result<&[SignalPoint], SigtraderError>;

    /// Signal at the last bar seen by `update`.
    fn latest_signal(&self) -> Result<Signal, SigtraderError> {
        Ok(self
            .signals()?
            .last()
            .map(|p| p.signal)
            .unwrap_or_default())
    }
}

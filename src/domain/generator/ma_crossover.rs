//! Moving average crossover signal.
//!
//! Fires Buy on the bar where the fast average moves above the slow one and
//! Sell on the bar where it falls back to or below it. While either average
//! is warming up the fast-above flag counts as false.

use crate::domain::error::SigtraderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::price::PriceBar;
use crate::domain::signal::Signal;

use super::{IndicatorColumns, SignalGenerator, SignalPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaKind {
    Sma,
    Ema,
}

impl MaKind {
    fn indicator(self, period: usize) -> IndicatorType {
        match self {
            MaKind::Sma => IndicatorType::Sma(period),
            MaKind::Ema => IndicatorType::Ema(period),
        }
    }

    fn label(self) -> &'static str {
        match self {
            MaKind::Sma => "SMA",
            MaKind::Ema => "EMA",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
    pub kind: MaKind,
    name: String,
    signals: Option<Vec<SignalPoint>>,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize, kind: MaKind) -> Result<Self, SigtraderError> {
        if fast_period == 0 || slow_period == 0 {
            return Err(SigtraderError::configuration(
                "moving average windows must be at least 1",
            ));
        }
        if fast_period >= slow_period {
            return Err(SigtraderError::configuration(format!(
                "fast window {fast_period} must be shorter than slow window {slow_period}"
            )));
        }

        Ok(Self::unchecked(fast_period, slow_period, kind))
    }

    /// Fast 8 / slow 20 simple moving averages.
    pub fn default_params() -> Self {
        Self::unchecked(8, 20, MaKind::Sma)
    }

    fn unchecked(fast_period: usize, slow_period: usize, kind: MaKind) -> Self {
        Self {
            fast_period,
            slow_period,
            kind,
            name: format!("{}_CROSS({},{})", kind.label(), fast_period, slow_period),
            signals: None,
        }
    }
}

impl SignalGenerator for MaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        self.fast_period.max(self.slow_period)
    }

    fn update(&mut self, bars: &[PriceBar]) {
        let fast = self.kind.indicator(self.fast_period).calculate(bars);
        let slow = self.kind.indicator(self.slow_period).calculate(bars);

        let mut points = Vec::with_capacity(bars.len());
        let mut prev_above = false;

        for (i, bar) in bars.iter().enumerate() {
            let fast_value = fast.value_at(i);
            let slow_value = slow.value_at(i);
            let fast_above = matches!((fast_value, slow_value), (Some(f), Some(s)) if f > s);

            let signal = match (prev_above, fast_above) {
                (false, true) if i > 0 => Signal::Buy,
                (true, false) => Signal::Sell,
                _ => Signal::DoNothing,
            };
            prev_above = fast_above;

            points.push(SignalPoint {
                date: bar.date,
                close: bar.close,
                pct_change: bar.pct_change,
                signal,
                columns: IndicatorColumns::Crossover {
                    fast: fast_value.unwrap_or(0.0),
                    slow: slow_value.unwrap_or(0.0),
                    fast_above,
                },
            });
        }

        self.signals = Some(points);
    }

    fn signals(&self) -> Result<&[SignalPoint], SigtraderError> {
        self.signals
            .as_deref()
            .ok_or_else(|| SigtraderError::NotComputed {
                generator: self.name.clone(),
            })
    }
}

//! Discrete trading decisions and the unanimity rule.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Signal {
    #[default]
    DoNothing,
    Buy,
    Sell,
}

impl Signal {
    pub fn is_actionable(self) -> bool {
        self != Signal::DoNothing
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::DoNothing => write!(f, "DO_NOTHING"),
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
        }
    }
}

/// Buy iff every input is Buy, Sell iff every input is Sell, DoNothing otherwise.
///
/// Partial agreement (e.g. two of three Buy) is not surfaced; it collapses to
/// DoNothing. No inputs also yields DoNothing.
pub fn unanimous<I>(signals: I) -> Signal
where
    I: IntoIterator<Item = Signal>,
{
    let mut iter = signals.into_iter();
    let first = match iter.next() {
        Some(s) if s.is_actionable() => s,
        _ => return Signal::DoNothing,
    };
    if iter.all(|s| s == first) {
        first
    } else {
        Signal::DoNothing
    }
}

//! Signal aggregation across generators and the per-step signal table.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::SigtraderError;
use super::generator::{MaCrossover, SignalGenerator};
use super::ledger::{Ledger, LedgerConfig};
use super::price::PriceBar;
use super::signal::{unanimous, Signal};

/// One step of the exported signal table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub close: f64,
    /// Each generator's signal at this bar, in registration order.
    pub generator_signals: Vec<(String, Signal)>,
    pub signal: Signal,
}

pub struct Agent {
    name: String,
    generators: Vec<Box<dyn SignalGenerator>>,
    table: Vec<SignalRow>,
    ledger: Ledger,
}

impl Agent {
    pub fn new(name: impl Into<String>, config: LedgerConfig) -> Self {
        Agent {
            name: name.into(),
            generators: Vec::new(),
            table: Vec::new(),
            ledger: Ledger::new(config),
        }
    }

    /// Agent holding the default 8/20 SMA crossover.
    pub fn basic(config: LedgerConfig) -> Self {
        let mut agent = Agent::new("Basic Agent", config);
        agent.generators.push(Box::new(MaCrossover::default_params()));
        agent
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_generator(
        &mut self,
        generator: Box<dyn SignalGenerator>,
    ) -> Result<(), SigtraderError> {
        if self.generators.iter().any(|g| g.name() == generator.name()) {
            return Err(SigtraderError::DuplicateGenerator {
                name: generator.name().to_string(),
            });
        }
        debug!(agent = %self.name, generator = generator.name(), "added generator");
        self.generators.push(generator);
        Ok(())
    }

    pub fn generator_names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// Bars before every generator can emit an actionable signal.
    pub fn warmup_bars(&self) -> usize {
        self.generators
            .iter()
            .map(|g| g.warmup_bars())
            .max()
            .unwrap_or(0)
    }

    /// Feed a causal prefix and act on its last bar.
    ///
    /// A prefix whose last bar is not newer than the last processed one is
    /// ignored and the previous decision is returned, so replays never touch
    /// operations that were already evaluated.
    pub fn update(&mut self, prefix: &[PriceBar]) -> Result<Signal, SigtraderError> {
        let Some(bar) = prefix.last() else {
            return Ok(Signal::DoNothing);
        };

        if let Some(last) = self.table.last() {
            if bar.date <= last.date {
                if bar.date < last.date {
                    warn!(
                        agent = %self.name,
                        date = %bar.date,
                        last = %last.date,
                        "ignoring prefix older than last processed bar"
                    );
                }
                return Ok(last.signal);
            }
        }

        let mut generator_signals = Vec::with_capacity(self.generators.len());
        for generator in self.generators.iter_mut() {
            generator.update(prefix);
            generator_signals.push((generator.name().to_string(), generator.latest_signal()?));
        }

        let signal = unanimous(generator_signals.iter().map(|(_, s)| *s));
        // The row only lands once the ledger has taken the bar.
        self.ledger.step(bar, signal)?;
        self.table.push(SignalRow {
            date: bar.date,
            close: bar.close,
            generator_signals,
            signal,
        });
        Ok(signal)
    }

    pub fn signals(&self) -> &[SignalRow] {
        &self.table
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}


impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field(
                "generators",
                &self.generators.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .field("table", &self.table)
            .field("ledger", &self.ledger)
            .finish()
    }
}

//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_log_adapter::JsonLogAdapter;
use crate::adapters::signal_csv_adapter::SignalCsvAdapter;
use crate::domain::agent::Agent;
use crate::domain::backtest::{
    self as backtest_engine, BacktestConfig, BacktestReport, ModelRunner, Runnable,
};
use crate::domain::config_validation::{
    resolve_symbol, validate_agent_config, validate_backtest_config,
    DEFAULT_ACTIVE_BALANCE_FRACTION, DEFAULT_GENERATORS, DEFAULT_INITIAL_BALANCE,
    DEFAULT_STOP_LOSS, DEFAULT_TAKE_PROFIT,
};
use crate::domain::error::SigtraderError;
use crate::domain::generator::{parse_generators, GeneratorSpec};
use crate::domain::ledger::LedgerConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportPort, SignalExportPort};

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Signal-driven trading agent backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Trade the first generator alone instead of the agent
        #[arg(long)]
        model_only: bool,
        /// Skip writing the JSON run log
        #[arg(long)]
        no_log: bool,
        /// Write the signal table and balance curve to this CSV file
        #[arg(long)]
        signals_out: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols with price files in the data directory
    Symbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
            log_dir,
            model_only,
            no_log,
            signals_out,
        } => run_backtest(
            &config,
            BacktestOptions {
                symbol,
                data_dir,
                log_dir,
                model_only,
                no_log,
                signals_out,
            },
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Symbols { config, data_dir } => run_symbols(config.as_ref(), data_dir),
    }
}

/// Command-line overrides for a backtest run.
#[derive(Debug, Default)]
pub struct BacktestOptions {
    pub symbol: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub model_only: bool,
    pub no_log: bool,
    pub signals_out: Option<PathBuf>,
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: SigtraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

fn run_backtest(config_path: &PathBuf, options: BacktestOptions) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_agent_config(&adapter) {
        return fail(e);
    }

    let symbol = match resolve_symbol(options.symbol.as_deref(), &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let bt_config = match build_backtest_config(&adapter, symbol) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let mut runnable = match build_runnable(&adapter, &bt_config, options.model_only) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    eprintln!("Loaded runner: {}", runnable.name());

    let data_dir = resolve_data_dir(options.data_dir, &adapter);
    let log_dir = options.log_dir.unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("backtest", "log_dir")
                .unwrap_or_else(|| "tmp".to_string()),
        )
    });

    let data_port = CsvAdapter::new(data_dir);
    let log_port = JsonLogAdapter::new(log_dir);
    let export_port = options.signals_out.map(SignalCsvAdapter::new);

    let report_port: Option<&dyn ReportPort> = if options.no_log {
        None
    } else {
        Some(&log_port)
    };

    run_backtest_pipeline(
        &data_port,
        runnable.as_mut(),
        &bt_config,
        report_port,
        export_port.as_ref().map(|p| p as &dyn SignalExportPort),
    )
}

pub fn resolve_data_dir(data_dir: Option<PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        PathBuf::from(
            config
                .get_string("backtest", "data_dir")
                .unwrap_or_else(|| "data".to_string()),
        )
    })
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    symbol: String,
) -> Result<BacktestConfig, SigtraderError> {
    let ledger = build_ledger_config(adapter)?;
    ledger.validate()?;

    Ok(BacktestConfig {
        symbol,
        initial_date: adapter.get_date("backtest", "initial_date")?,
        final_date: adapter.get_date("backtest", "final_date")?,
        ledger,
    })
}

pub fn build_ledger_config(adapter: &dyn ConfigPort) -> Result<LedgerConfig, SigtraderError> {
    Ok(LedgerConfig {
        initial_balance: adapter.get_double(
            "backtest",
            "initial_balance",
            DEFAULT_INITIAL_BALANCE,
        )?,
        active_balance_fraction: adapter.get_double(
            "agent",
            "active_balance_fraction",
            DEFAULT_ACTIVE_BALANCE_FRACTION,
        )?,
        take_profit_pct: adapter.get_double("agent", "take_profit", DEFAULT_TAKE_PROFIT)?,
        stop_loss_pct: adapter.get_double("agent", "stop_loss", DEFAULT_STOP_LOSS)?,
    })
}

pub fn build_generator_specs(
    adapter: &dyn ConfigPort,
) -> Result<Vec<GeneratorSpec>, SigtraderError> {
    let list = adapter
        .get_string("agent", "generators")
        .unwrap_or_else(|| DEFAULT_GENERATORS.to_string());
    parse_generators(&list)
}

pub fn build_agent(
    adapter: &dyn ConfigPort,
    ledger: LedgerConfig,
) -> Result<Agent, SigtraderError> {
    let name = adapter
        .get_string("agent", "name")
        .unwrap_or_else(|| "Basic Agent".to_string());
    let mut agent = Agent::new(name, ledger);
    for spec in build_generator_specs(adapter)? {
        agent.add_generator(spec.build()?)?;
    }
    Ok(agent)
}

/// The configured agent, or its first generator alone when `model_only`.
pub fn build_runnable(
    adapter: &dyn ConfigPort,
    bt_config: &BacktestConfig,
    model_only: bool,
) -> Result<Box<dyn Runnable>, SigtraderError> {
    if model_only {
        let spec = build_generator_specs(adapter)?
            .into_iter()
            .next()
            .unwrap_or_default();
        Ok(Box::new(ModelRunner::new(spec.build()?, bt_config.ledger)?))
    } else {
        Ok(Box::new(build_agent(adapter, bt_config.ledger)?))
    }
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    runnable: &mut dyn Runnable,
    bt_config: &BacktestConfig,
    report_port: Option<&dyn ReportPort>,
    export_port: Option<&dyn SignalExportPort>,
) -> ExitCode {
    eprintln!(
        "Running backtest: {} on {}, {} to {}",
        runnable.name(),
        bt_config.symbol,
        fmt_date(bt_config.initial_date),
        fmt_date(bt_config.final_date),
    );

    let report = match backtest_engine::run_backtest(data_port, runnable, bt_config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_summary(&report);

    if let Some(port) = report_port {
        match port.log(&report) {
            Ok(path) => eprintln!("\nLog written to: {}", path.display()),
            Err(e) => return fail(e),
        }
    }

    if let Some(port) = export_port {
        if let Err(e) = port.export(&report) {
            return fail(e);
        }
        eprintln!("Signals exported");
    }

    ExitCode::SUCCESS
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "?".to_string())
}

pub fn print_summary(report: &BacktestReport) {
    eprintln!("\n=== Results: {} on {} ===", report.runner, report.used_on);
    eprintln!("Initial Balance:  {:.2}", report.initial_balance);
    eprintln!("Final Balance:    {:.2}", report.final_balance);
    eprintln!(
        "Profit:           {:.2} ({:.2}%)",
        report.profit,
        report.profit_pct * 100.0
    );
    eprintln!(
        "Operations:       {} total, {} closed",
        report.total_operations, report.closed_operations
    );
    eprintln!(
        "Closed:           {} success, {} fail",
        report.successes, report.failures
    );
    eprintln!(
        "Active:           {} open, {:.2} marked",
        report.active_count, report.active_value
    );
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_agent_config(&adapter) {
        return fail(e);
    }
    let symbol = match resolve_symbol(None, &adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let ledger = match build_ledger_config(&adapter) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };
    let agent = match build_agent(&adapter, ledger) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    eprintln!("\nAgent: {}", agent.name());
    eprintln!("  symbol:    {}", symbol);
    eprintln!(
        "  balance:   {:.2} ({:.0}% per operation)",
        ledger.initial_balance,
        ledger.active_balance_fraction * 100.0
    );
    eprintln!(
        "  exits:     +{:.2}% / -{:.2}%",
        ledger.take_profit_pct * 100.0,
        ledger.stop_loss_pct * 100.0
    );
    eprintln!("\nGenerators (warm-up {} bars):", agent.warmup_bars());
    for name in agent.generator_names() {
        eprintln!("  {}", name);
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_symbols(config_path: Option<&PathBuf>, data_dir: Option<PathBuf>) -> ExitCode {
    let data_dir = match config_path {
        Some(path) => match load_config(path) {
            Ok(config) => resolve_data_dir(data_dir, &config),
            Err(code) => return code,
        },
        None => data_dir.unwrap_or_else(|| PathBuf::from("data")),
    };

    let symbols = match CsvAdapter::new(data_dir.clone()).list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No price files found in {}", data_dir.display());
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

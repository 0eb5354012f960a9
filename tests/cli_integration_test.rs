//! CLI integration tests for config loading and backtest orchestration.
//!
//! Tests cover:
//! - Config parsing (build_backtest_config, build_agent, build_runnable)
//! - Full pipeline with MockDataPort and a JSON log on disk
//! - `backtest` and `validate` commands against real INI and CSV files

mod common;

use common::*;
use sigtrader::adapters::file_config_adapter::FileConfigAdapter;
use sigtrader::adapters::json_log_adapter::JsonLogAdapter;
use sigtrader::adapters::signal_csv_adapter::SignalCsvAdapter;
use sigtrader::cli::{self, Cli, Command};
use sigtrader::domain::error::SigtraderError;
use sigtrader::ports::report_port::{ReportPort, SignalExportPort};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn code(c: ExitCode) -> String {
    format!("{:?}", c)
}

fn expect(n: u8) -> String {
    format!("{:?}", ExitCode::from(n))
}

const VALID_INI: &str = r#"
[backtest]
symbol = aapl
initial_date = 2024-01-01
final_date = 2024-12-31
initial_balance = 1000.0

[agent]
name = Pair Agent
active_balance_fraction = 0.1
take_profit = 0.03
stop_loss = 0.01
generators = sma_crossover(2,3), ema_crossover(2,3)
"#;

mod config_loading {
    use super::*;
    use sigtrader::domain::backtest::Runnable;
    use sigtrader::domain::config_validation::resolve_symbol;

    #[test]
    fn build_backtest_config_reads_all_fields() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let symbol = resolve_symbol(None, &adapter).unwrap();
        let config = cli::build_backtest_config(&adapter, symbol).unwrap();

        assert_eq!(config.symbol, "AAPL");
        assert_eq!(config.initial_date, Some(date(2024, 1, 1)));
        assert_eq!(config.final_date, Some(date(2024, 12, 31)));
        assert_eq!(config.ledger.initial_balance, 1000.0);
        assert_eq!(config.ledger.active_balance_fraction, 0.1);
        assert_eq!(config.ledger.take_profit_pct, 0.03);
        assert_eq!(config.ledger.stop_loss_pct, 0.01);
    }

    #[test]
    fn ledger_defaults_apply() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        let ledger = cli::build_ledger_config(&adapter).unwrap();
        assert_eq!(ledger, sigtrader::domain::ledger::LedgerConfig::default());
    }

    #[test]
    fn unreadable_numbers_are_not_defaulted() {
        let adapter =
            FileConfigAdapter::from_string("[agent]\ntake_profit = three percent\n").unwrap();
        let err = cli::build_ledger_config(&adapter).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { ref key, .. } if key == "take_profit"));
        assert_eq!(code(ExitCode::from(&err)), expect(2));
    }

    #[test]
    fn build_agent_registers_generators_in_order() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let ledger = cli::build_ledger_config(&adapter).unwrap();
        let agent = cli::build_agent(&adapter, ledger).unwrap();
        assert_eq!(agent.name(), "Pair Agent");
        assert_eq!(
            agent.generator_names(),
            vec!["SMA_CROSS(2,3)", "EMA_CROSS(2,3)"]
        );
    }

    #[test]
    fn default_agent_is_basic() {
        let adapter = FileConfigAdapter::from_string("[agent]\n").unwrap();
        let ledger = cli::build_ledger_config(&adapter).unwrap();
        let agent = cli::build_agent(&adapter, ledger).unwrap();
        assert_eq!(agent.name(), "Basic Agent");
        assert_eq!(agent.generator_names(), vec!["SMA_CROSS(8,20)"]);
    }

    #[test]
    fn duplicate_generators_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[agent]\ngenerators = sma(2,3), sma_crossover(2,3)\n")
                .unwrap();
        let ledger = cli::build_ledger_config(&adapter).unwrap();
        let err = cli::build_agent(&adapter, ledger).unwrap_err();
        assert!(matches!(err, SigtraderError::DuplicateGenerator { .. }));
    }

    #[test]
    fn model_only_uses_first_generator() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter, "AAPL".into()).unwrap();
        let runnable = cli::build_runnable(&adapter, &config, true).unwrap();
        assert_eq!(runnable.name(), "SMA_CROSS(2,3)");

        let runnable = cli::build_runnable(&adapter, &config, false).unwrap();
        assert_eq!(runnable.name(), "Pair Agent");
    }
}

mod pipeline {
    use super::*;

    fn only_file(dir: &Path) -> PathBuf {
        let entries: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        entries.into_iter().next().unwrap()
    }

    #[test]
    fn pipeline_writes_log_and_signals() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter, "AAPL".into()).unwrap();
        let mut runnable = cli::build_runnable(&adapter, &config, false).unwrap();
        let port =
            MockDataPort::new().with_closes("AAPL", daily_closes("2024-01-01", &step_closes()));

        let dir = tempfile::TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");
        let signals_path = dir.path().join("signals.csv");
        let log = JsonLogAdapter::new(&log_dir);
        let export = SignalCsvAdapter::new(signals_path.clone());

        let exit = cli::run_backtest_pipeline(
            &port,
            runnable.as_mut(),
            &config,
            Some(&log as &dyn ReportPort),
            Some(&export as &dyn SignalExportPort),
        );
        assert_eq!(code(exit), code(ExitCode::SUCCESS));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(only_file(&log_dir)).unwrap()).unwrap();
        assert_eq!(value["Used on"], "AAPL");
        assert_eq!(value["Initial date"], "2024-01-01");
        assert_eq!(value["Final date"], "2024-12-31");

        let csv = std::fs::read_to_string(&signals_path).unwrap();
        assert_eq!(csv.lines().count(), 31);
    }

    #[test]
    fn pipeline_without_data_exits_with_data_code() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_backtest_config(&adapter, "AAPL".into()).unwrap();
        let mut runnable = cli::build_runnable(&adapter, &config, false).unwrap();

        let exit =
            cli::run_backtest_pipeline(&MockDataPort::new(), runnable.as_mut(), &config, None, None);
        assert_eq!(code(exit), expect(5));
    }
}

mod commands {
    use super::*;

    fn backtest(config: PathBuf, data_dir: &Path, log_dir: &Path) -> Command {
        Command::Backtest {
            config,
            symbol: None,
            data_dir: Some(data_dir.to_path_buf()),
            log_dir: Some(log_dir.to_path_buf()),
            model_only: false,
            no_log: false,
            signals_out: None,
        }
    }

    fn write_prices(dir: &Path, symbol: &str) {
        let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
        for (d, c) in daily_closes("2024-01-01", &step_closes()) {
            content.push_str(&format!("{d},{c},{c},{c},{c},1000\n"));
        }
        std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
    }

    #[test]
    fn backtest_command_end_to_end() {
        let dir = tempfile::TempDir::new().unwrap();
        write_prices(dir.path(), "AAPL");
        let ini = write_temp_ini(VALID_INI);
        let log_dir = dir.path().join("tmp");

        let exit = cli::run(Cli {
            command: backtest(ini.path().to_path_buf(), dir.path(), &log_dir),
        });
        assert_eq!(code(exit), code(ExitCode::SUCCESS));
        assert_eq!(std::fs::read_dir(&log_dir).unwrap().count(), 1);
    }

    #[test]
    fn no_log_skips_log_file() {
        let dir = tempfile::TempDir::new().unwrap();
        write_prices(dir.path(), "MSFT");
        let ini = write_temp_ini(VALID_INI);
        let log_dir = dir.path().join("tmp");

        let exit = cli::run(Cli {
            command: Command::Backtest {
                config: ini.path().to_path_buf(),
                symbol: Some("msft".into()),
                data_dir: Some(dir.path().to_path_buf()),
                log_dir: Some(log_dir.clone()),
                model_only: true,
                no_log: true,
                signals_out: None,
            },
        });
        assert_eq!(code(exit), code(ExitCode::SUCCESS));
        assert!(!log_dir.exists());
    }

    #[test]
    fn invalid_config_exits_with_config_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = write_temp_ini(&VALID_INI.replace(
            "active_balance_fraction = 0.1",
            "active_balance_fraction = 1.5",
        ));

        let exit = cli::run(Cli {
            command: backtest(ini.path().to_path_buf(), dir.path(), dir.path()),
        });
        assert_eq!(code(exit), expect(2));
    }

    #[test]
    fn missing_price_file_exits_with_data_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let ini = write_temp_ini(VALID_INI);

        let exit = cli::run(Cli {
            command: backtest(ini.path().to_path_buf(), dir.path(), dir.path()),
        });
        assert_eq!(code(exit), expect(5));
    }

    #[test]
    fn missing_config_file_exits_with_config_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let exit = cli::run(Cli {
            command: backtest(
                PathBuf::from("/nonexistent/sigtrader.ini"),
                dir.path(),
                dir.path(),
            ),
        });
        assert_eq!(code(exit), expect(2));
    }

    #[test]
    fn validate_command() {
        let ini = write_temp_ini(VALID_INI);
        let exit = cli::run(Cli {
            command: Command::Validate {
                config: ini.path().to_path_buf(),
            },
        });
        assert_eq!(code(exit), code(ExitCode::SUCCESS));

        let bad = write_temp_ini(&VALID_INI.replace("sma_crossover(2,3)", "sma_crossover(3,2)"));
        let exit = cli::run(Cli {
            command: Command::Validate {
                config: bad.path().to_path_buf(),
            },
        });
        assert_eq!(code(exit), expect(2));
    }

    #[test]
    fn symbols_command_lists_price_files() {
        let dir = tempfile::TempDir::new().unwrap();
        write_prices(dir.path(), "AAPL");
        let exit = cli::run(Cli {
            command: Command::Symbols {
                config: None,
                data_dir: Some(dir.path().to_path_buf()),
            },
        });
        assert_eq!(code(exit), code(ExitCode::SUCCESS));

        let exit = cli::run(Cli {
            command: Command::Symbols {
                config: None,
                data_dir: Some(dir.path().join("missing")),
            },
        });
        assert_eq!(code(exit), expect(5));
    }
}

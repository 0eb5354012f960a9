//! Configuration validation.
//!
//! Checks every `[backtest]` and `[agent]` field before a run starts, so a
//! bad file fails fast with the offending section and key.

use crate::domain::error::SigtraderError;
use crate::domain::generator::parse_generators;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_INITIAL_BALANCE: f64 = 1000.0;
pub const DEFAULT_ACTIVE_BALANCE_FRACTION: f64 = 0.1;
pub const DEFAULT_TAKE_PROFIT: f64 = 0.03;
pub const DEFAULT_STOP_LOSS: f64 = 0.01;
pub const DEFAULT_GENERATORS: &str = "sma_crossover(8,20)";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_initial_balance(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_agent_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_active_balance_fraction(config)?;
    validate_threshold(config, "take_profit", DEFAULT_TAKE_PROFIT)?;
    validate_threshold(config, "stop_loss", DEFAULT_STOP_LOSS)?;
    validate_generators(config)?;
    Ok(())
}

/// `[backtest] symbol` unless overridden; upper-cased.
pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, SigtraderError> {
    let symbol = match symbol_override {
        Some(s) => s.to_string(),
        None => config.get_string("backtest", "symbol").unwrap_or_default(),
    };
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        });
    }
    Ok(symbol)
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("backtest", "initial_balance", DEFAULT_INITIAL_BALANCE)?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(SigtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_balance".to_string(),
            reason: "initial_balance must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let initial = config.get_date("backtest", "initial_date")?;
    let fin = config.get_date("backtest", "final_date")?;

    let initial = initial.ok_or_else(|| SigtraderError::ConfigMissing {
        section: "backtest".to_string(),
        key: "initial_date".to_string(),
    })?;
    let fin = fin.ok_or_else(|| SigtraderError::ConfigMissing {
        section: "backtest".to_string(),
        key: "final_date".to_string(),
    })?;

    if initial >= fin {
        return Err(SigtraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_date".to_string(),
            reason: "initial_date must be before final_date".to_string(),
        });
    }
    Ok(())
}

fn validate_active_balance_fraction(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double(
        "agent",
        "active_balance_fraction",
        DEFAULT_ACTIVE_BALANCE_FRACTION,
    )?;
    if !(value > 0.0 && value < 1.0) {
        return Err(SigtraderError::ConfigInvalid {
            section: "agent".to_string(),
            key: "active_balance_fraction".to_string(),
            reason: "active_balance_fraction must be between 0 and 1 (exclusive)".to_string(),
        });
    }
    Ok(())
}

fn validate_threshold(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<(), SigtraderError> {
    let value = config.get_double("agent", key, default)?;
    if !(0.0..1.0).contains(&value) {
        return Err(SigtraderError::ConfigInvalid {
            section: "agent".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be in [0, 1)"),
        });
    }
    Ok(())
}

fn validate_generators(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let list = config
        .get_string("agent", "generators")
        .unwrap_or_else(|| DEFAULT_GENERATORS.to_string());
    parse_generators(&list).map_err(|e| SigtraderError::ConfigInvalid {
        section: "agent".to_string(),
        key: "generators".to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const DATES: &str = "initial_date = 2020-01-01\nfinal_date = 2020-06-01\n";

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
symbol = AAPL
initial_date = 2020-01-01
final_date = 2020-06-01
initial_balance = 1000.0
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn initial_balance_defaults_when_absent() {
        let config = make_config(&format!("[backtest]\n{DATES}"));
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn initial_balance_must_be_positive() {
        for value in ["0", "-100"] {
            let config = make_config(&format!("[backtest]\ninitial_balance = {value}\n{DATES}"));
            let err = validate_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_balance")
            );
        }
    }

    #[test]
    fn invalid_date_format_fails() {
        let config =
            make_config("[backtest]\ninitial_date = 2020/01/01\nfinal_date = 2020-06-01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_date"));
    }

    #[test]
    fn missing_final_date_fails() {
        let config = make_config("[backtest]\ninitial_date = 2020-01-01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "final_date"));
    }

    #[test]
    fn initial_after_final_fails() {
        let config =
            make_config("[backtest]\ninitial_date = 2020-06-01\nfinal_date = 2020-01-01\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_date"));
    }

    #[test]
    fn resolve_symbol_prefers_override() {
        let config = make_config("[backtest]\nsymbol = aapl\n");
        assert_eq!(resolve_symbol(None, &config).unwrap(), "AAPL");
        assert_eq!(resolve_symbol(Some("msft"), &config).unwrap(), "MSFT");
    }

    #[test]
    fn missing_symbol_fails() {
        let config = make_config("[backtest]\nsymbol =   \n");
        let err = resolve_symbol(None, &config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn empty_agent_section_uses_defaults() {
        let config = make_config("[agent]\n");
        assert!(validate_agent_config(&config).is_ok());
    }

    #[test]
    fn valid_agent_config_passes() {
        let config = make_config(
            r#"
[agent]
name = Pair
active_balance_fraction = 0.2
take_profit = 0.05
stop_loss = 0.0
generators = sma_crossover(8,20), ema_crossover(5,13)
"#,
        );
        assert!(validate_agent_config(&config).is_ok());
    }

    #[test]
    fn fraction_bounds_are_exclusive() {
        for value in ["0", "1", "1.5", "-0.1"] {
            let config = make_config(&format!("[agent]\nactive_balance_fraction = {value}\n"));
            let err = validate_agent_config(&config).unwrap_err();
            assert!(
                matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "active_balance_fraction"),
                "fraction {value} accepted"
            );
        }
    }

    #[test]
    fn non_numeric_values_are_not_defaulted() {
        let cases = [
            ("agent", "active_balance_fraction", "1,5"),
            ("agent", "take_profit", "three percent"),
            ("agent", "stop_loss", "1%"),
            ("agent", "active_balance_fraction", "NaN"),
        ];
        for (section, key, value) in cases {
            let config = make_config(&format!("[{section}]\n{key} = {value}\n"));
            let err = validate_agent_config(&config).unwrap_err();
            assert!(
                matches!(err, SigtraderError::ConfigInvalid { key: ref k, .. } if k == key),
                "{key} = {value} accepted"
            );
        }

        let config = make_config(&format!("[backtest]\ninitial_balance = 1.000,50\n{DATES}"));
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_balance"));
    }

    #[test]
    fn take_profit_out_of_range_fails() {
        let config = make_config("[agent]\ntake_profit = 1.0\n");
        let err = validate_agent_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "take_profit"));
    }

    #[test]
    fn stop_loss_negative_fails() {
        let config = make_config("[agent]\nstop_loss = -0.01\n");
        let err = validate_agent_config(&config).unwrap_err();
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "stop_loss"));
    }

    #[test]
    fn unparseable_generators_fail() {
        for list in ["macd(1,2)", "sma_crossover(20,8)", "sma_crossover(8,20"] {
            let config = make_config(&format!("[agent]\ngenerators = {list}\n"));
            let err = validate_agent_config(&config).unwrap_err();
            assert!(
                matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "generators"),
                "{list} accepted"
            );
        }
    }
}

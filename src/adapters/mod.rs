//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_log_adapter;
pub mod signal_csv_adapter;

//! Configuration loading tests

use rust_decimal_macros::dec;
use std::io::Write;
use trade_governor::config::{Config, ConfigError, LogFormatConfig, RiskConfig};

#[test]
fn test_config_example_loads() {
    let config = Config::from_toml(include_str!("../../config.toml.example")).unwrap();

    assert_eq!(config.risk, RiskConfig::default());
    assert_eq!(config.telemetry.log_level, "info");
    assert_eq!(config.telemetry.log_format, LogFormatConfig::Pretty);
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [risk]
        max_positions = 2
        min_trade_interval_secs = 900
        loss_scaling = [1.0, 0.4]

        [telemetry]
        log_format = "json"
        metrics_port = 9100
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.risk.max_positions, 2);
    assert_eq!(config.risk.min_trade_interval_secs, Some(900));
    assert_eq!(config.risk.scaling_factor(5), dec!(0.4));
    assert_eq!(config.telemetry.log_format, LogFormatConfig::Json);
    assert_eq!(config.telemetry.metrics_port, Some(9100));
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::ReadFile(_))));
}

#[test]
fn test_invalid_values_are_fatal() {
    let result = Config::from_toml("[risk]\ncrypto_stop_loss_percent = 5.0\n");
    assert!(matches!(result, Err(ConfigError::Validation(_))));

    let result = Config::from_toml("[risk]\nmax_positions = \"five\"\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_effective_config_round_trips() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    let reloaded = Config::from_toml(&rendered).unwrap();
    assert_eq!(reloaded.risk, config.risk);
}

//! Configuration types for trade-governor

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::risk::AssetClass;

/// Longest accepted frequency window or trade interval: one year
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid risk config: {0}")]
    Validation(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Risk governor configuration
///
/// Percent-valued fields are in percent units (`2.0` = 2%).
/// `max_position_size` is a fraction of the account balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Percent of balance eligible as the per-trade risk budget
    pub capital_use_percentage: Decimal,
    /// Hard cap on one position's notional, as a fraction of balance
    pub max_position_size: Decimal,
    /// Minimum allowed notional per trade
    pub min_trade_amount: Decimal,
    /// Default equity stop distance (percent)
    pub stop_loss_percent: Decimal,
    /// Default equity take-profit distance (percent)
    pub take_profit_percent: Decimal,
    /// Equity trailing stop distance (percent)
    pub trailing_stop_percent: Decimal,
    /// Crypto stop distance (percent), also the minimum accepted stop distance
    pub crypto_stop_loss_percent: Decimal,
    /// Crypto take-profit distance (percent)
    pub crypto_take_profit_percent: Decimal,
    /// Crypto trailing stop distance (percent)
    pub crypto_trailing_stop_percent: Decimal,
    /// Floor that `crypto_stop_loss_percent` must respect (percent)
    pub crypto_stop_loss_floor_percent: Decimal,
    /// Absolute daily realized loss budget
    pub max_daily_loss: Decimal,
    /// Maximum concurrent open positions
    pub max_positions: usize,
    /// Minimum signal confidence accepted
    pub min_confidence: Decimal,
    /// Executions allowed in one rolling window
    pub max_trades_per_window: usize,
    /// Rolling window length (seconds)
    pub window_duration_secs: u64,
    /// Optional minimum spacing between executions (seconds)
    pub min_trade_interval_secs: Option<u64>,
    /// Consecutive losses that trip the breaker
    pub consecutive_loss_limit: u32,
    /// Risk multiplier per consecutive loss count; the last entry repeats
    pub loss_scaling: Vec<Decimal>,
    /// Optional hard floor on the risk/reward ratio
    pub min_risk_reward: Option<Decimal>,
    /// Reject a second open position in a symbol
    pub one_position_per_symbol: bool,
    /// UTC hour at which the trading day rolls over
    pub daily_reset_hour_utc: u32,
    /// Clear an active halt when the trading day rolls over
    pub reset_halt_on_new_day: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            capital_use_percentage: dec!(2.0),
            max_position_size: dec!(0.25),
            min_trade_amount: dec!(1.0),
            stop_loss_percent: dec!(2.0),
            take_profit_percent: dec!(4.0),
            trailing_stop_percent: dec!(1.5),
            crypto_stop_loss_percent: dec!(8.0),
            crypto_take_profit_percent: dec!(15.0),
            crypto_trailing_stop_percent: dec!(3.0),
            crypto_stop_loss_floor_percent: dec!(8.0),
            max_daily_loss: dec!(500),
            max_positions: 5,
            min_confidence: dec!(0.6),
            max_trades_per_window: 3,
            window_duration_secs: 60,
            min_trade_interval_secs: None,
            consecutive_loss_limit: 3,
            loss_scaling: vec![dec!(1.0), dec!(0.5), dec!(0.25)],
            min_risk_reward: None,
            one_position_per_symbol: true,
            daily_reset_hour_utc: 0,
            reset_halt_on_new_day: false,
        }
    }
}

impl RiskConfig {
    /// Check every field; a failure here is fatal at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        let hundred = dec!(100);

        if self.capital_use_percentage <= Decimal::ZERO || self.capital_use_percentage > hundred {
            return invalid(format!(
                "capital_use_percentage must be in (0, 100], got {}",
                self.capital_use_percentage
            ));
        }
        if self.max_position_size <= Decimal::ZERO || self.max_position_size > Decimal::ONE {
            return invalid(format!(
                "max_position_size must be in (0, 1], got {}",
                self.max_position_size
            ));
        }
        if self.min_trade_amount < Decimal::ZERO {
            return invalid(format!(
                "min_trade_amount must not be negative, got {}",
                self.min_trade_amount
            ));
        }

        let percents = [
            ("stop_loss_percent", self.stop_loss_percent),
            ("take_profit_percent", self.take_profit_percent),
            ("trailing_stop_percent", self.trailing_stop_percent),
            ("crypto_stop_loss_percent", self.crypto_stop_loss_percent),
            ("crypto_take_profit_percent", self.crypto_take_profit_percent),
            ("crypto_trailing_stop_percent", self.crypto_trailing_stop_percent),
        ];
        for (name, value) in percents {
            if value <= Decimal::ZERO || value >= hundred {
                return invalid(format!("{name} must be in (0, 100), got {value}"));
            }
        }

        if self.crypto_stop_loss_percent < self.crypto_stop_loss_floor_percent {
            return invalid(format!(
                "crypto_stop_loss_percent {} is below the {}% floor",
                self.crypto_stop_loss_percent, self.crypto_stop_loss_floor_percent
            ));
        }
        if self.max_daily_loss <= Decimal::ZERO {
            return invalid(format!(
                "max_daily_loss must be positive, got {}",
                self.max_daily_loss
            ));
        }
        if self.max_positions == 0 {
            return invalid("max_positions must be at least 1".to_string());
        }
        if self.min_confidence < Decimal::ZERO || self.min_confidence > Decimal::ONE {
            return invalid(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            ));
        }
        if self.max_trades_per_window == 0 {
            return invalid("max_trades_per_window must be at least 1".to_string());
        }
        if self.window_duration_secs == 0 || self.window_duration_secs > MAX_WINDOW_SECS {
            return invalid(format!(
                "window_duration_secs must be in [1, {MAX_WINDOW_SECS}], got {}",
                self.window_duration_secs
            ));
        }
        if let Some(interval) = self.min_trade_interval_secs {
            if interval > MAX_WINDOW_SECS {
                return invalid(format!(
                    "min_trade_interval_secs must be at most {MAX_WINDOW_SECS}, got {interval}"
                ));
            }
        }
        if self.consecutive_loss_limit == 0 {
            return invalid("consecutive_loss_limit must be at least 1".to_string());
        }

        if self.loss_scaling.is_empty() {
            return invalid("loss_scaling must have at least one entry".to_string());
        }
        let mut previous = Decimal::ONE;
        for factor in &self.loss_scaling {
            if *factor <= Decimal::ZERO || *factor > Decimal::ONE {
                return invalid(format!("loss_scaling entries must be in (0, 1], got {factor}"));
            }
            if *factor > previous {
                return invalid("loss_scaling must be non-increasing".to_string());
            }
            previous = *factor;
        }

        if let Some(ratio) = self.min_risk_reward {
            if ratio <= Decimal::ZERO {
                return invalid(format!("min_risk_reward must be positive, got {ratio}"));
            }
        }
        if self.daily_reset_hour_utc >= 24 {
            return invalid(format!(
                "daily_reset_hour_utc must be below 24, got {}",
                self.daily_reset_hour_utc
            ));
        }

        Ok(())
    }

    /// Rolling frequency window
    pub fn window_duration(&self) -> Duration {
        clamped_seconds(self.window_duration_secs)
    }

    /// Minimum spacing between executions, if configured
    pub fn min_trade_interval(&self) -> Option<Duration> {
        self.min_trade_interval_secs.map(clamped_seconds)
    }

    /// Risk multiplier for the given loss streak
    pub fn scaling_factor(&self, consecutive_losses: u32) -> Decimal {
        let idx = (consecutive_losses as usize).min(self.loss_scaling.len().saturating_sub(1));
        self.loss_scaling.get(idx).copied().unwrap_or(Decimal::ONE)
    }

    /// Stop distance percent for an asset class
    pub fn stop_loss_percent_for(&self, asset_class: AssetClass) -> Decimal {
        match asset_class {
            AssetClass::Equity => self.stop_loss_percent,
            AssetClass::Crypto => self.crypto_stop_loss_percent,
        }
    }

    /// Take-profit distance percent for an asset class
    pub fn take_profit_percent_for(&self, asset_class: AssetClass) -> Decimal {
        match asset_class {
            AssetClass::Equity => self.take_profit_percent,
            AssetClass::Crypto => self.crypto_take_profit_percent,
        }
    }

    /// Trailing stop distance percent for an asset class
    pub fn trailing_stop_percent_for(&self, asset_class: AssetClass) -> Decimal {
        match asset_class {
            AssetClass::Equity => self.trailing_stop_percent,
            AssetClass::Crypto => self.crypto_trailing_stop_percent,
        }
    }
}

fn invalid(msg: String) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(msg))
}

fn clamped_seconds(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_WINDOW_SECS) as i64)
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormatConfig,
    /// Prometheus listener port; disabled when absent
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormatConfig::Pretty,
            metrics_port: None,
        }
    }
}

/// Log output format as written in the config file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatConfig {
    #[default]
    Pretty,
    Json,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.risk.validate()?;
        Ok(config)
    }
}

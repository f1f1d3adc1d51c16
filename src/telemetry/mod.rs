//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use logging::{init_logging, LogFormat};
pub use self::metrics::{
    init_metrics, record_decision, record_latency, set_gauge, GaugeMetric, LatencyMetric,
};

use crate::config::{LogFormatConfig, TelemetryConfig};

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    let format = match config.log_format {
        LogFormatConfig::Pretty => LogFormat::Pretty,
        LogFormatConfig::Json => LogFormat::Json,
    };
    init_logging(&config.log_level, format)?;

    if let Some(port) = config.metrics_port {
        init_metrics(port)?;
    }

    Ok(())
}

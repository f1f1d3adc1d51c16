//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::risk::TradeDecision;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full governor evaluation
    Evaluate,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Open position count
    OpenPositions,
    /// Aggregate open notional
    OpenNotional,
    /// Current loss streak
    ConsecutiveLosses,
    /// Realized losses today
    DailyLoss,
    /// 1 when trading is halted
    TradingHalted,
}

/// Install the Prometheus exporter on `port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;
    tracing::info!(%addr, "Metrics exporter listening");
    Ok(())
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Evaluate => "governor_evaluate_latency_ms",
    };
    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::OpenPositions => "governor_open_positions",
        GaugeMetric::OpenNotional => "governor_open_notional_usd",
        GaugeMetric::ConsecutiveLosses => "governor_consecutive_losses",
        GaugeMetric::DailyLoss => "governor_daily_loss_usd",
        GaugeMetric::TradingHalted => "governor_trading_halted",
    };
    metrics::gauge!(metric_name).set(value);
}

/// Count a decision, labelling rejections by reason
pub fn record_decision(decision: &TradeDecision) {
    match decision {
        TradeDecision::Approved(_) => {
            metrics::counter!("governor_decisions_approved_total").increment(1);
        }
        TradeDecision::Rejected(reason) => {
            metrics::counter!("governor_decisions_rejected_total", "reason" => reason.code())
                .increment(1);
        }
    }
}

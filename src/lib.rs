//! trade-governor: pre-trade risk governor for automated trading loops
//!
//! This library provides the core components for:
//! - Volatility-aware position sizing with loss-streak scaling
//! - Rolling-window trade frequency limits
//! - Consecutive-loss circuit breaker
//! - Open exposure and daily loss tracking
//! - Stop-loss and take-profit helpers
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod risk;
pub mod telemetry;

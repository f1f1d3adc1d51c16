//! CLI interface for trade-governor
//!
//! Provides subcommands for:
//! - `evaluate`: Size and gate a single trade
//! - `replay`: Run an event log through one governor
//! - `config`: Show the effective configuration

mod evaluate;
mod replay;

pub use evaluate::{AssetClassArg, EvaluateArgs, SideArg};
pub use replay::{parse_events, replay, ReplayArgs, ReplayEvent, ReplayOutput};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "trade-governor")]
#[command(about = "Pre-trade risk governor: sizing, loss breaker and frequency limits")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Size and gate a single trade request
    Evaluate(EvaluateArgs),
    /// Replay a JSON-lines event log through the governor
    Replay(ReplayArgs),
    /// Show configuration
    Config,
}

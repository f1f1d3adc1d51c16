//! Replay command implementation
//!
//! Feeds a JSON-lines event log through a single governor, the way the
//! trading loop and fill callbacks would drive it live.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::RiskConfig;
use crate::risk::{OutcomeReport, PositionId, RiskGovernor, TradeDecision, TradeRequest};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines event file
    #[arg(long)]
    pub events: PathBuf,
}

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// Evaluate a request; when `execute` is set an approval is confirmed as executed
    Evaluate {
        at: DateTime<Utc>,
        request: TradeRequest,
        #[serde(default)]
        execute: bool,
    },
    /// Realized P&L for a closed trade
    Outcome {
        at: DateTime<Utc>,
        symbol: String,
        pnl: Decimal,
    },
    Halt {
        at: DateTime<Utc>,
        reason: String,
    },
    Reset,
    ResetDaily {
        at: DateTime<Utc>,
    },
}

/// Result of replaying one event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayOutput {
    Decision {
        line: usize,
        decision: TradeDecision,
        position_id: Option<PositionId>,
    },
    Outcome {
        line: usize,
        report: OutcomeReport,
    },
    Halted {
        line: usize,
    },
    Reset {
        line: usize,
    },
    DailyReset {
        line: usize,
    },
}

/// Parse an event log; blank lines and `#` comments are skipped
pub fn parse_events(content: &str) -> anyhow::Result<Vec<(usize, ReplayEvent)>> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            serde_json::from_str(line)
                .map(|event| (line_no, event))
                .with_context(|| format!("invalid event on line {line_no}"))
        })
        .collect()
}

/// Drive a governor through a sequence of events
pub fn replay(governor: &RiskGovernor, events: Vec<(usize, ReplayEvent)>) -> Vec<ReplayOutput> {
    events
        .into_iter()
        .map(|(line, event)| match event {
            ReplayEvent::Evaluate {
                at,
                request,
                execute,
            } => {
                let decision = governor.evaluate_at(&request, at);
                let position_id = match (&decision, execute) {
                    (TradeDecision::Approved(assessment), true) => {
                        Some(governor.record_execution_at(assessment, at))
                    }
                    _ => None,
                };
                ReplayOutput::Decision {
                    line,
                    decision,
                    position_id,
                }
            }
            ReplayEvent::Outcome { at, symbol, pnl } => ReplayOutput::Outcome {
                line,
                report: governor.record_outcome_at(&symbol, pnl, at),
            },
            ReplayEvent::Halt { at, reason } => {
                governor.halt_at(reason, at);
                ReplayOutput::Halted { line }
            }
            ReplayEvent::Reset => {
                governor.reset();
                ReplayOutput::Reset { line }
            }
            ReplayEvent::ResetDaily { at } => {
                governor.reset_daily_at(at);
                ReplayOutput::DailyReset { line }
            }
        })
        .collect()
}

impl ReplayArgs {
    pub async fn execute(&self, config: &RiskConfig) -> anyhow::Result<()> {
        let content = tokio::fs::read_to_string(&self.events)
            .await
            .with_context(|| format!("failed to read {}", self.events.display()))?;
        let events = parse_events(&content)?;
        tracing::info!(events = events.len(), path = ?self.events, "Replaying event log");

        let governor = RiskGovernor::new(config.clone())?;
        for output in replay(&governor, events) {
            println!("{}", serde_json::to_string(&output)?);
        }
        println!("{}", serde_json::to_string_pretty(&governor.snapshot())?);
        Ok(())
    }
}

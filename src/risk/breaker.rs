//! Consecutive-loss circuit breaker
//!
//! ACTIVE until the realized loss streak reaches the configured limit, then
//! HALTED until an explicit reset. A single non-negative outcome clears the
//! streak but never clears a halt on its own.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakerState {
    Active,
    Halted,
}

/// Reason for trading halt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// Loss streak reached the configured limit
    ConsecutiveLosses(u32),
    /// Operator halted trading
    Manual(String),
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::ConsecutiveLosses(n) => write!(f, "{n} consecutive losses"),
            HaltReason::Manual(reason) => write!(f, "manual halt: {reason}"),
        }
    }
}

/// Tracks the realized loss streak and trips a halt
#[derive(Debug, Clone)]
pub struct ConsecutiveLossBreaker {
    limit: u32,
    consecutive_losses: u32,
    state: BreakerState,
    halted_at: Option<DateTime<Utc>>,
    halt_reason: Option<HaltReason>,
}

impl ConsecutiveLossBreaker {
    /// Create a breaker that trips after `limit` consecutive losses
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            consecutive_losses: 0,
            state: BreakerState::Active,
            halted_at: None,
            halt_reason: None,
        }
    }

    /// Apply a realized outcome. Returns true if this outcome tripped the breaker.
    pub fn record_outcome(&mut self, pnl: Decimal, at: DateTime<Utc>) -> bool {
        if pnl < Decimal::ZERO {
            self.consecutive_losses += 1;
        } else {
            self.consecutive_losses = 0;
        }

        if self.state == BreakerState::Active && self.consecutive_losses >= self.limit {
            self.trip(HaltReason::ConsecutiveLosses(self.consecutive_losses), at);
            return true;
        }
        false
    }

    /// Halt on operator request. A halt already in place keeps its original reason.
    pub fn halt(&mut self, reason: HaltReason, at: DateTime<Utc>) {
        if self.state == BreakerState::Active {
            self.trip(reason, at);
        }
    }

    fn trip(&mut self, reason: HaltReason, at: DateTime<Utc>) {
        self.state = BreakerState::Halted;
        self.halted_at = Some(at);
        self.halt_reason = Some(reason);
    }

    /// Clear the streak and return to ACTIVE
    pub fn reset(&mut self) {
        self.consecutive_losses = 0;
        self.state = BreakerState::Active;
        self.halted_at = None;
        self.halt_reason = None;
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == BreakerState::Halted
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    pub fn halted_at(&self) -> Option<DateTime<Utc>> {
        self.halted_at
    }

    pub fn halt_reason(&self) -> Option<&HaltReason> {
        self.halt_reason.as_ref()
    }
}

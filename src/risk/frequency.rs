//! Rolling-window trade frequency limiter
//!
//! Keeps execution timestamps inside a sliding window measured back from
//! "now". At most `max_trades` executions fit in any window-length span,
//! regardless of how they align to the clock.
//!
//! Every execution newer than the cutoff counts, including fills stamped
//! later than the `now` passed to [`TradeFrequencyLimiter::check`]. The
//! window count and the minimum interval both read that same set.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use super::types::RejectionReason;

/// Enforces a maximum number of executions per rolling window
#[derive(Debug, Clone)]
pub struct TradeFrequencyLimiter {
    max_trades: usize,
    window: Duration,
    min_interval: Option<Duration>,
    /// Execution timestamps, oldest first
    executions: VecDeque<DateTime<Utc>>,
}

impl TradeFrequencyLimiter {
    /// Create a limiter allowing `max_trades` per `window`
    pub fn new(max_trades: usize, window: Duration) -> Self {
        Self {
            max_trades,
            window,
            min_interval: None,
            executions: VecDeque::new(),
        }
    }

    /// Also require a minimum spacing between executions
    pub fn with_min_interval(mut self, min_interval: Option<Duration>) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Drop executions that fell out of the window ending at `now`
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let Some(cutoff) = now.checked_sub_signed(self.window) else {
            return;
        };
        while let Some(ts) = self.executions.front() {
            if *ts <= cutoff {
                self.executions.pop_front();
            } else {
                break;
            }
        }
    }

    /// Check whether another execution is allowed at `now`
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<(), RejectionReason> {
        self.prune(now);

        let in_window = self.executions.len();
        if in_window >= self.max_trades {
            return Err(RejectionReason::FrequencyLimitExceeded {
                executions: in_window,
                window_secs: self.window.num_seconds() as u64,
            });
        }

        if let (Some(interval), Some(last)) = (self.min_interval, self.executions.back()) {
            let elapsed = now - *last;
            if elapsed < interval {
                return Err(RejectionReason::MinimumIntervalNotElapsed {
                    remaining_secs: (interval - elapsed).num_seconds().max(1),
                });
            }
        }

        Ok(())
    }

    /// Record an actual execution
    pub fn record_execution(&mut self, at: DateTime<Utc>) {
        // Fills can be reported out of order; keep the deque sorted
        let idx = self.executions.partition_point(|ts| *ts <= at);
        self.executions.insert(idx, at);

        let latest = self.executions.back().copied().unwrap_or(at);
        self.prune(latest);
    }

    /// Executions currently inside the window
    pub fn recent_count(&self) -> usize {
        self.executions.len()
    }

    /// Timestamps currently tracked, oldest first
    pub fn recent_executions(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.executions.iter()
    }

    /// Most recent execution, if any
    pub fn last_execution(&self) -> Option<DateTime<Utc>> {
        self.executions.back().copied()
    }
}

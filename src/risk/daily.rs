//! Daily realized loss budget

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::types::RejectionReason;

/// Accumulates realized losses for the current trading day
#[derive(Debug, Clone)]
pub struct DailyLossTracker {
    /// UTC hour at which the trading day rolls
    reset_hour_utc: u32,
    /// Trading day the totals belong to; set on first use
    trading_day: Option<NaiveDate>,
    /// Sum of losing outcomes today (positive number)
    loss_total: Decimal,
    /// Net realized P&L today
    realized_pnl: Decimal,
}

impl DailyLossTracker {
    /// Create a tracker whose day rolls at `reset_hour_utc`
    pub fn new(reset_hour_utc: u32) -> Self {
        Self {
            reset_hour_utc,
            trading_day: None,
            loss_total: dec!(0),
            realized_pnl: dec!(0),
        }
    }

    /// Trading day a timestamp falls in
    pub fn trading_day_for(&self, at: DateTime<Utc>) -> NaiveDate {
        (at - Duration::hours(self.reset_hour_utc as i64)).date_naive()
    }

    /// Advance to the trading day of `now`. Returns true if a new day began.
    pub fn roll(&mut self, now: DateTime<Utc>) -> bool {
        let day = self.trading_day_for(now);
        match self.trading_day {
            None => {
                self.trading_day = Some(day);
                false
            }
            Some(current) if day > current => {
                self.trading_day = Some(day);
                self.reset_totals();
                true
            }
            Some(_) => false,
        }
    }

    /// Record a realized outcome
    pub fn record(&mut self, pnl: Decimal) {
        self.realized_pnl = self.realized_pnl.saturating_add(pnl);
        if pnl < Decimal::ZERO {
            self.loss_total = self.loss_total.saturating_add(-pnl);
        }
    }

    /// Conservative pre-check: today's losses plus the new trade's risk must fit
    pub fn check(&self, risk_amount: Decimal, limit: Decimal) -> Result<(), RejectionReason> {
        let projected = self.loss_total.saturating_add(risk_amount);
        if projected > limit {
            return Err(RejectionReason::DailyLossLimitExceeded { projected, limit });
        }
        Ok(())
    }

    /// Reset for new trading day
    pub fn reset_totals(&mut self) {
        self.loss_total = dec!(0);
        self.realized_pnl = dec!(0);
    }

    pub fn loss_total(&self) -> Decimal {
        self.loss_total
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn trading_day(&self) -> Option<NaiveDate> {
        self.trading_day
    }
}

//! Risk governor
//!
//! Single entry point between a strategy signal and the broker. Owns the
//! account's [`SafetyState`] behind one lock so that an order-fill callback
//! reporting an outcome can never interleave with an evaluation.
//!
//! Evaluation order, cheapest first, first failure wins:
//! 1. request shape and minimum confidence
//! 2. open position capacity (and one position per symbol)
//! 3. rolling frequency window
//! 4. breaker halt
//! 5. position sizing
//! 6. asset-class floors and optional risk/reward floor
//! 7. daily loss budget

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::breaker::{ConsecutiveLossBreaker, HaltReason};
use super::daily::DailyLossTracker;
use super::exposure::{ClosedPosition, ExposureTracker, PositionId};
use super::frequency::TradeFrequencyLimiter;
use super::sizing::PositionSizer;
use super::stops::ExitReason;
use super::types::{
    AssetClass, RejectionReason, TradeDecision, TradeRequest, TradeRiskAssessment,
};
use crate::config::{ConfigError, RiskConfig};
use crate::telemetry::{self, GaugeMetric, LatencyMetric};

/// Mutable per-account safety state
#[derive(Debug, Clone)]
pub struct SafetyState {
    breaker: ConsecutiveLossBreaker,
    limiter: TradeFrequencyLimiter,
    exposure: ExposureTracker,
    daily: DailyLossTracker,
}

impl SafetyState {
    /// Fresh state: no losses, no exposure, not halted
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            breaker: ConsecutiveLossBreaker::new(config.consecutive_loss_limit),
            limiter: TradeFrequencyLimiter::new(
                config.max_trades_per_window,
                config.window_duration(),
            )
            .with_min_interval(config.min_trade_interval()),
            exposure: ExposureTracker::new(),
            daily: DailyLossTracker::new(config.daily_reset_hour_utc),
        }
    }

    pub fn snapshot(&self) -> SafetySnapshot {
        SafetySnapshot {
            consecutive_losses: self.breaker.consecutive_losses(),
            trading_halted: self.breaker.is_halted(),
            halted_at: self.breaker.halted_at(),
            halt_reason: self.breaker.halt_reason().cloned(),
            recent_execution_timestamps: self.limiter.recent_executions().copied().collect(),
            open_position_count: self.exposure.open_count(),
            open_notional_total: self.exposure.open_notional(),
            daily_loss_total: self.daily.loss_total(),
            daily_realized_pnl: self.daily.realized_pnl(),
            trading_day: self.daily.trading_day(),
        }
    }
}

/// Point-in-time view of [`SafetyState`] for status reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySnapshot {
    pub consecutive_losses: u32,
    pub trading_halted: bool,
    pub halted_at: Option<DateTime<Utc>>,
    pub halt_reason: Option<HaltReason>,
    pub recent_execution_timestamps: Vec<DateTime<Utc>>,
    pub open_position_count: usize,
    pub open_notional_total: Decimal,
    pub daily_loss_total: Decimal,
    pub daily_realized_pnl: Decimal,
    pub trading_day: Option<NaiveDate>,
}

/// Result of reporting a realized outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeReport {
    pub symbol: String,
    pub realized_pnl: Decimal,
    pub consecutive_losses: u32,
    pub trading_halted: bool,
    /// This outcome tripped the breaker
    pub newly_halted: bool,
    /// Position closed by this outcome, if one was tracked
    pub closed: Option<ClosedPosition>,
}

/// Orchestrates sizing, limits and the loss breaker for one account
#[derive(Debug)]
pub struct RiskGovernor {
    config: RiskConfig,
    sizer: PositionSizer,
    state: Mutex<SafetyState>,
}

impl RiskGovernor {
    /// Validate the config and build a governor with fresh state
    pub fn new(config: RiskConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = SafetyState::new(&config);
        Self::with_state(config, state)
    }

    /// Build a governor around existing state
    pub fn with_state(config: RiskConfig, state: SafetyState) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            max_positions = config.max_positions,
            max_trades_per_window = config.max_trades_per_window,
            window_secs = config.window_duration_secs,
            consecutive_loss_limit = config.consecutive_loss_limit,
            max_daily_loss = %config.max_daily_loss,
            "Risk governor initialized"
        );
        Ok(Self {
            sizer: PositionSizer::new(config.clone()),
            config,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Evaluate a request now
    pub fn evaluate(&self, request: &TradeRequest) -> TradeDecision {
        self.evaluate_at(request, Utc::now())
    }

    /// Evaluate a request at `now`. Never touches the broker.
    pub fn evaluate_at(&self, request: &TradeRequest, now: DateTime<Utc>) -> TradeDecision {
        let started = Instant::now();

        let decision = {
            let mut state = self.state.lock();
            self.roll_day(&mut state, now);
            match self.gate(&mut state, request, now) {
                Ok(assessment) => TradeDecision::Approved(assessment),
                Err(reason) => TradeDecision::Rejected(reason),
            }
        };

        match &decision {
            TradeDecision::Approved(a) => tracing::debug!(
                symbol = %request.symbol,
                size = %a.position_size,
                notional = %a.notional_value,
                risk = %a.risk_amount,
                risk_reward = %a.risk_reward_ratio.round_dp(2),
                "Trade approved"
            ),
            TradeDecision::Rejected(reason) => tracing::info!(
                symbol = %request.symbol,
                code = reason.code(),
                category = ?reason.category(),
                %reason,
                "Trade rejected"
            ),
        }
        telemetry::record_decision(&decision);
        telemetry::record_latency(LatencyMetric::Evaluate, started.elapsed());

        decision
    }

    fn gate(
        &self,
        state: &mut SafetyState,
        request: &TradeRequest,
        now: DateTime<Utc>,
    ) -> Result<TradeRiskAssessment, RejectionReason> {
        request.validate()?;
        if request.confidence_score < self.config.min_confidence {
            return Err(RejectionReason::ConfidenceBelowMinimum {
                confidence: request.confidence_score,
                minimum: self.config.min_confidence,
            });
        }

        state.exposure.check_capacity(self.config.max_positions)?;
        if self.config.one_position_per_symbol {
            state.exposure.check_symbol(&request.symbol)?;
        }

        state.limiter.check(now)?;

        if let Some(reason) = state.breaker.halt_reason() {
            return Err(RejectionReason::TradingHalted(reason.clone()));
        }

        let assessment = self
            .sizer
            .size(request, state.breaker.consecutive_losses())?;

        if assessment.asset_class == AssetClass::Crypto {
            // Out of range means a stop far wider than any floor
            let distance_pct = request
                .stop_distance()
                .checked_div(request.entry_price)
                .and_then(|v| v.checked_mul(dec!(100)));
            if let Some(distance_pct) = distance_pct {
                if distance_pct < self.config.crypto_stop_loss_percent {
                    return Err(RejectionReason::CryptoStopTooTight {
                        distance_pct: distance_pct.round_dp(4),
                        floor_pct: self.config.crypto_stop_loss_percent,
                    });
                }
            }
        }
        if let Some(minimum) = self.config.min_risk_reward {
            if assessment.risk_reward_ratio < minimum {
                return Err(RejectionReason::RiskRewardTooLow {
                    ratio: assessment.risk_reward_ratio.round_dp(4),
                    minimum,
                });
            }
        }

        state
            .daily
            .check(assessment.risk_amount, self.config.max_daily_loss)?;

        Ok(assessment)
    }

    /// Confirm that an approved trade executed now
    pub fn record_execution(&self, assessment: &TradeRiskAssessment) -> PositionId {
        self.record_execution_at(assessment, Utc::now())
    }

    /// Confirm that an approved trade executed at `at`
    pub fn record_execution_at(
        &self,
        assessment: &TradeRiskAssessment,
        at: DateTime<Utc>,
    ) -> PositionId {
        let mut state = self.state.lock();
        self.roll_day(&mut state, at);

        state.limiter.record_execution(at);
        let id = state.exposure.open(assessment, at);

        tracing::info!(
            symbol = %assessment.symbol,
            position_id = %id,
            size = %assessment.position_size,
            notional = %assessment.notional_value,
            open_positions = state.exposure.open_count(),
            "Execution recorded"
        );
        publish_gauges(&state);
        id
    }

    /// Report a realized outcome now
    pub fn record_outcome(&self, symbol: &str, realized_pnl: Decimal) -> OutcomeReport {
        self.record_outcome_at(symbol, realized_pnl, Utc::now())
    }

    /// Report a realized outcome at `at`. Breaker, exposure and daily loss
    /// are updated as one transition.
    pub fn record_outcome_at(
        &self,
        symbol: &str,
        realized_pnl: Decimal,
        at: DateTime<Utc>,
    ) -> OutcomeReport {
        let mut state = self.state.lock();
        self.roll_day(&mut state, at);

        let closed = state.exposure.close_symbol(symbol, realized_pnl, at);
        if closed.is_none() {
            tracing::warn!(symbol, "Outcome reported with no tracked open position");
        }
        state.daily.record(realized_pnl);
        let newly_halted = state.breaker.record_outcome(realized_pnl, at);

        let consecutive_losses = state.breaker.consecutive_losses();
        if realized_pnl < Decimal::ZERO {
            tracing::warn!(symbol, pnl = %realized_pnl, consecutive_losses, "Loss recorded");
        } else {
            tracing::info!(symbol, pnl = %realized_pnl, "Profit recorded");
        }
        if newly_halted {
            tracing::error!(
                consecutive_losses,
                limit = self.config.consecutive_loss_limit,
                "TRADING HALTED: consecutive loss limit reached"
            );
        }
        publish_gauges(&state);

        OutcomeReport {
            symbol: symbol.to_string(),
            realized_pnl,
            consecutive_losses,
            trading_halted: state.breaker.is_halted(),
            newly_halted,
            closed,
        }
    }

    /// Operator reset: clear the loss streak and any halt
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let previous = state.breaker.halt_reason().cloned();
        state.breaker.reset();
        tracing::warn!(?previous, "Trading resumed by reset");
        publish_gauges(&state);
    }

    /// Operator halt
    pub fn halt(&self, reason: impl Into<String>) {
        self.halt_at(reason, Utc::now())
    }

    pub fn halt_at(&self, reason: impl Into<String>, at: DateTime<Utc>) {
        let reason = reason.into();
        let mut state = self.state.lock();
        tracing::error!(%reason, "TRADING HALTED by operator");
        state.breaker.halt(HaltReason::Manual(reason), at);
        publish_gauges(&state);
    }

    /// Operator-triggered daily boundary
    pub fn reset_daily(&self) {
        self.reset_daily_at(Utc::now())
    }

    pub fn reset_daily_at(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock();
        state.daily.roll(now);
        state.daily.reset_totals();
        if self.config.reset_halt_on_new_day {
            state.breaker.reset();
        }
        tracing::info!("Daily loss totals reset");
        publish_gauges(&state);
    }

    /// Whether the open position in `symbol` has reached its stop or target
    pub fn check_exit(&self, symbol: &str, current_price: Decimal) -> Option<ExitReason> {
        self.state.lock().exposure.check_exit(symbol, current_price)
    }

    pub fn is_halted(&self) -> bool {
        self.state.lock().breaker.is_halted()
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.state.lock().breaker.halt_reason().cloned()
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.state.lock().breaker.consecutive_losses()
    }

    pub fn open_position_count(&self) -> usize {
        self.state.lock().exposure.open_count()
    }

    pub fn open_notional(&self) -> Decimal {
        self.state.lock().exposure.open_notional()
    }

    pub fn daily_loss_total(&self) -> Decimal {
        self.state.lock().daily.loss_total()
    }

    pub fn snapshot(&self) -> SafetySnapshot {
        self.state.lock().snapshot()
    }

    fn roll_day(&self, state: &mut SafetyState, now: DateTime<Utc>) {
        if !state.daily.roll(now) {
            return;
        }
        tracing::info!(day = ?state.daily.trading_day(), "New trading day");
        if self.config.reset_halt_on_new_day && state.breaker.is_halted() {
            state.breaker.reset();
            tracing::warn!("Halt cleared at daily boundary");
        }
    }
}

fn publish_gauges(state: &SafetyState) {
    use rust_decimal::prelude::ToPrimitive;

    telemetry::set_gauge(
        GaugeMetric::OpenPositions,
        state.exposure.open_count() as f64,
    );
    telemetry::set_gauge(
        GaugeMetric::OpenNotional,
        state.exposure.open_notional().to_f64().unwrap_or(0.0),
    );
    telemetry::set_gauge(
        GaugeMetric::ConsecutiveLosses,
        state.breaker.consecutive_losses() as f64,
    );
    telemetry::set_gauge(
        GaugeMetric::DailyLoss,
        state.daily.loss_total().to_f64().unwrap_or(0.0),
    );
    telemetry::set_gauge(
        GaugeMetric::TradingHalted,
        if state.breaker.is_halted() { 1.0 } else { 0.0 },
    );
}

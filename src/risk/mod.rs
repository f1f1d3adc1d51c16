//! Risk management module
//!
//! Position sizing, trade frequency limits, the consecutive-loss breaker,
//! exposure tracking and the governor that runs them in order.

mod breaker;
mod daily;
mod exposure;
mod frequency;
mod governor;
mod sizing;
pub mod stops;
mod types;

pub use breaker::{BreakerState, ConsecutiveLossBreaker, HaltReason};
pub use daily::DailyLossTracker;
pub use exposure::{ClosedPosition, ExposureTracker, OpenPosition, PositionId};
pub use frequency::TradeFrequencyLimiter;
pub use governor::{OutcomeReport, RiskGovernor, SafetySnapshot, SafetyState};
pub use sizing::{round_quantity, PositionSizer, CRYPTO_QUANTITY_DP};
pub use stops::ExitReason;
pub use types::{
    AssetClass, RejectionCategory, RejectionReason, Side, SizingError, TradeDecision,
    TradeRequest, TradeRiskAssessment,
};

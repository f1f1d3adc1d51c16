//! Risk management types

use super::HaltReason;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Long entry; stop below, target above
    Buy,
    /// Short entry; stop above, target below
    Sell,
}

/// Asset class with its own risk floors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Whole-share instruments
    Equity,
    /// Fractional, higher-volatility instruments
    Crypto,
}

impl AssetClass {
    /// Guess the asset class from a ticker (`BTC/USD`, `ETHUSD` are crypto)
    pub fn infer(symbol: &str) -> Self {
        if symbol.contains('/') || symbol.ends_with("USD") {
            AssetClass::Crypto
        } else {
            AssetClass::Equity
        }
    }
}

/// A candidate trade produced by the strategy loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub side: Side,
    pub asset_class: AssetClass,
    pub entry_price: Decimal,
    pub stop_loss_price: Decimal,
    #[serde(default)]
    pub take_profit_price: Option<Decimal>,
    /// Signal confidence in [0, 1]
    pub confidence_score: Decimal,
    pub account_balance: Decimal,
    pub buying_power: Decimal,
}

impl TradeRequest {
    /// Distance between entry and stop
    pub fn stop_distance(&self) -> Decimal {
        (self.entry_price - self.stop_loss_price).abs()
    }

    /// Check the request shape. Does not look at any account state.
    pub fn validate(&self) -> Result<(), SizingError> {
        if self.entry_price <= Decimal::ZERO {
            return Err(SizingError::InvalidPrice(self.entry_price));
        }
        if self.stop_loss_price <= Decimal::ZERO {
            return Err(SizingError::InvalidPrice(self.stop_loss_price));
        }

        let stop_on_loss_side = match self.side {
            Side::Buy => self.stop_loss_price < self.entry_price,
            Side::Sell => self.stop_loss_price > self.entry_price,
        };
        if !stop_on_loss_side {
            return Err(SizingError::InvalidStopLoss {
                entry: self.entry_price,
                stop: self.stop_loss_price,
            });
        }

        if let Some(target) = self.take_profit_price {
            let target_on_profit_side = match self.side {
                Side::Buy => target > self.entry_price,
                Side::Sell => target < self.entry_price && target > Decimal::ZERO,
            };
            if !target_on_profit_side {
                return Err(SizingError::InvalidTakeProfit {
                    entry: self.entry_price,
                    take_profit: target,
                });
            }
        }

        if self.confidence_score < Decimal::ZERO || self.confidence_score > Decimal::ONE {
            return Err(SizingError::InvalidConfidence(self.confidence_score));
        }
        if self.account_balance <= Decimal::ZERO {
            return Err(SizingError::InsufficientBalance(self.account_balance));
        }

        Ok(())
    }
}

/// Sizing result before gating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRiskAssessment {
    pub symbol: String,
    pub side: Side,
    pub asset_class: AssetClass,
    pub entry_price: Decimal,
    pub stop_loss_price: Decimal,
    /// Supplied target, or the default derived from config
    pub take_profit_price: Decimal,
    /// Quantity; whole units for equities
    pub position_size: Decimal,
    /// position_size * entry_price
    pub notional_value: Decimal,
    /// Loss if the stop is hit exactly
    pub risk_amount: Decimal,
    /// Gain if the target is hit exactly
    pub reward_amount: Decimal,
    pub risk_reward_ratio: Decimal,
    /// risk_amount as a percent of balance
    pub max_loss_percent: Decimal,
    /// Loss-streak multiplier applied to the risk budget
    pub scaling_factor: Decimal,
    pub confidence_score: Decimal,
}

/// Final outcome of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "detail", rename_all = "lowercase")]
pub enum TradeDecision {
    Approved(TradeRiskAssessment),
    Rejected(RejectionReason),
}

impl TradeDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, TradeDecision::Approved(_))
    }

    /// Sizing, present iff approved
    pub fn assessment(&self) -> Option<&TradeRiskAssessment> {
        match self {
            TradeDecision::Approved(assessment) => Some(assessment),
            TradeDecision::Rejected(_) => None,
        }
    }

    /// Reason, present iff rejected
    pub fn rejection_reason(&self) -> Option<&RejectionReason> {
        match self {
            TradeDecision::Approved(_) => None,
            TradeDecision::Rejected(reason) => Some(reason),
        }
    }
}

/// Position sizing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizingError {
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),
    #[error("Invalid stop loss {stop} for entry {entry}")]
    InvalidStopLoss { entry: Decimal, stop: Decimal },
    #[error("Invalid take profit {take_profit} for entry {entry}")]
    InvalidTakeProfit { entry: Decimal, take_profit: Decimal },
    #[error("Confidence {0} outside [0, 1]")]
    InvalidConfidence(Decimal),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(Decimal),
    #[error("Notional {notional} below minimum {minimum}")]
    BelowMinimumNotional { notional: Decimal, minimum: Decimal },
    #[error("Sizing overflowed the decimal range")]
    ArithmeticOverflow,
}

/// Rejection category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionCategory {
    /// Malformed request; never retried
    Input,
    /// Economically inadmissible trade
    Budget,
    /// Protective limit; persists past the current cycle
    Safety,
}

/// Why a trade was not allowed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RejectionReason {
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),
    #[error("Invalid stop loss {stop} for entry {entry}")]
    InvalidStopLoss { entry: Decimal, stop: Decimal },
    #[error("Invalid take profit {take_profit} for entry {entry}")]
    InvalidTakeProfit { entry: Decimal, take_profit: Decimal },
    #[error("Confidence {0} outside [0, 1]")]
    InvalidConfidence(Decimal),
    #[error("Confidence {confidence} below minimum {minimum}")]
    ConfidenceBelowMinimum { confidence: Decimal, minimum: Decimal },
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(Decimal),
    #[error("Notional {notional} below minimum {minimum}")]
    BelowMinimumNotional { notional: Decimal, minimum: Decimal },
    #[error("Sizing overflowed the decimal range")]
    ArithmeticOverflow,
    #[error("Maximum positions reached: {open}/{max}")]
    MaxPositionsExceeded { open: usize, max: usize },
    #[error("Position already open in {0}")]
    PositionAlreadyOpen(String),
    #[error("Frequency limit reached: {executions} trades in {window_secs}s")]
    FrequencyLimitExceeded { executions: usize, window_secs: u64 },
    #[error("Minimum trade interval not elapsed: {remaining_secs}s remaining")]
    MinimumIntervalNotElapsed { remaining_secs: i64 },
    #[error("Trading halted: {0}")]
    TradingHalted(HaltReason),
    #[error("Crypto stop distance {distance_pct}% below {floor_pct}% floor")]
    CryptoStopTooTight {
        distance_pct: Decimal,
        floor_pct: Decimal,
    },
    #[error("Risk/reward {ratio} below minimum {minimum}")]
    RiskRewardTooLow { ratio: Decimal, minimum: Decimal },
    #[error("Daily loss limit: projected {projected} exceeds {limit}")]
    DailyLossLimitExceeded { projected: Decimal, limit: Decimal },
}

impl RejectionReason {
    pub fn category(&self) -> RejectionCategory {
        use RejectionReason::*;
        match self {
            InvalidPrice(_)
            | InvalidStopLoss { .. }
            | InvalidTakeProfit { .. }
            | InvalidConfidence(_)
            | ConfidenceBelowMinimum { .. }
            | ArithmeticOverflow => RejectionCategory::Input,
            InsufficientBalance(_)
            | BelowMinimumNotional { .. }
            | MaxPositionsExceeded { .. }
            | PositionAlreadyOpen(_)
            | CryptoStopTooTight { .. }
            | RiskRewardTooLow { .. } => RejectionCategory::Budget,
            FrequencyLimitExceeded { .. }
            | MinimumIntervalNotElapsed { .. }
            | TradingHalted(_)
            | DailyLossLimitExceeded { .. } => RejectionCategory::Safety,
        }
    }

    /// Stable label for logs and metrics
    pub fn code(&self) -> &'static str {
        use RejectionReason::*;
        match self {
            InvalidPrice(_) => "invalid_price",
            InvalidStopLoss { .. } => "invalid_stop_loss",
            InvalidTakeProfit { .. } => "invalid_take_profit",
            InvalidConfidence(_) => "invalid_confidence",
            ConfidenceBelowMinimum { .. } => "confidence_below_minimum",
            InsufficientBalance(_) => "insufficient_balance",
            BelowMinimumNotional { .. } => "below_minimum_notional",
            ArithmeticOverflow => "arithmetic_overflow",
            MaxPositionsExceeded { .. } => "max_positions_exceeded",
            PositionAlreadyOpen(_) => "position_already_open",
            FrequencyLimitExceeded { .. } => "frequency_limit_exceeded",
            MinimumIntervalNotElapsed { .. } => "minimum_interval_not_elapsed",
            TradingHalted(_) => "trading_halted",
            CryptoStopTooTight { .. } => "crypto_stop_too_tight",
            RiskRewardTooLow { .. } => "risk_reward_too_low",
            DailyLossLimitExceeded { .. } => "daily_loss_limit_exceeded",
        }
    }
}

impl From<SizingError> for RejectionReason {
    fn from(err: SizingError) -> Self {
        match err {
            SizingError::InvalidPrice(p) => RejectionReason::InvalidPrice(p),
            SizingError::InvalidStopLoss { entry, stop } => {
                RejectionReason::InvalidStopLoss { entry, stop }
            }
            SizingError::InvalidTakeProfit { entry, take_profit } => {
                RejectionReason::InvalidTakeProfit { entry, take_profit }
            }
            SizingError::InvalidConfidence(c) => RejectionReason::InvalidConfidence(c),
            SizingError::InsufficientBalance(b) => RejectionReason::InsufficientBalance(b),
            SizingError::BelowMinimumNotional { notional, minimum } => {
                RejectionReason::BelowMinimumNotional { notional, minimum }
            }
            SizingError::ArithmeticOverflow => RejectionReason::ArithmeticOverflow,
        }
    }
}

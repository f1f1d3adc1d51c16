//! Risk-based position sizing
//!
//! Sizes a position so that hitting the stop loses at most the risk budget:
//! `balance * capital_use_percentage`, scaled down by the current loss
//! streak and by signal confidence. The result is then clamped by the
//! per-position notional cap and by buying power.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::stops;
use super::types::{AssetClass, SizingError, TradeRequest, TradeRiskAssessment};
use crate::config::RiskConfig;

/// Decimal places kept for crypto quantities
pub const CRYPTO_QUANTITY_DP: u32 = 8;

/// Converts a trade request into a sized assessment
#[derive(Debug, Clone)]
pub struct PositionSizer {
    config: RiskConfig,
}

impl PositionSizer {
    /// Create a sizer from a validated config
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Size a request given the current loss streak
    pub fn size(
        &self,
        request: &TradeRequest,
        consecutive_losses: u32,
    ) -> Result<TradeRiskAssessment, SizingError> {
        request.validate()?;

        let balance = request.account_balance;
        let scaling_factor = self.config.scaling_factor(consecutive_losses);

        let risk_budget = balance
            .checked_mul(self.config.capital_use_percentage)
            .and_then(|v| v.checked_div(dec!(100)))
            .and_then(|v| v.checked_mul(scaling_factor))
            .and_then(|v| v.checked_mul(request.confidence_score))
            .ok_or(SizingError::ArithmeticOverflow)?;

        let stop_distance = request.stop_distance();
        if stop_distance.is_zero() {
            return Err(SizingError::InvalidStopLoss {
                entry: request.entry_price,
                stop: request.stop_loss_price,
            });
        }

        let raw_size = risk_budget
            .checked_div(stop_distance)
            .ok_or(SizingError::ArithmeticOverflow)?;

        // Notional cap: per-position fraction of balance and available buying power
        let max_notional = balance
            .checked_mul(self.config.max_position_size)
            .ok_or(SizingError::ArithmeticOverflow)?
            .min(request.buying_power)
            .max(Decimal::ZERO);
        let max_size = max_notional
            .checked_div(request.entry_price)
            .ok_or(SizingError::ArithmeticOverflow)?;
        let capped_size = raw_size.min(max_size);

        let position_size = round_quantity(capped_size, request.asset_class);
        let notional_value = position_size
            .checked_mul(request.entry_price)
            .ok_or(SizingError::ArithmeticOverflow)?;

        if position_size.is_zero() || notional_value < self.config.min_trade_amount {
            return Err(SizingError::BelowMinimumNotional {
                notional: notional_value,
                minimum: self.config.min_trade_amount,
            });
        }

        let take_profit_price = match request.take_profit_price {
            Some(target) => target,
            None => stops::default_take_profit(
                request.entry_price,
                request.stop_loss_price,
                request.side,
                request.asset_class,
                &self.config,
            )
            .ok_or(SizingError::ArithmeticOverflow)?,
        };
        let reward_distance = (take_profit_price - request.entry_price).abs();

        let risk_amount = position_size
            .checked_mul(stop_distance)
            .ok_or(SizingError::ArithmeticOverflow)?;
        let reward_amount = position_size
            .checked_mul(reward_distance)
            .ok_or(SizingError::ArithmeticOverflow)?;
        let risk_reward_ratio = reward_distance
            .checked_div(stop_distance)
            .ok_or(SizingError::ArithmeticOverflow)?;
        let max_loss_percent = risk_amount
            .checked_div(balance)
            .and_then(|v| v.checked_mul(dec!(100)))
            .ok_or(SizingError::ArithmeticOverflow)?;

        Ok(TradeRiskAssessment {
            symbol: request.symbol.clone(),
            side: request.side,
            asset_class: request.asset_class,
            entry_price: request.entry_price,
            stop_loss_price: request.stop_loss_price,
            take_profit_price,
            position_size,
            notional_value,
            risk_amount,
            reward_amount,
            risk_reward_ratio,
            max_loss_percent,
            scaling_factor,
            confidence_score: request.confidence_score,
        })
    }
}

/// Whole units for equities, truncated fractional units for crypto
pub fn round_quantity(quantity: Decimal, asset_class: AssetClass) -> Decimal {
    if quantity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    match asset_class {
        AssetClass::Equity => quantity.floor(),
        AssetClass::Crypto => {
            quantity.round_dp_with_strategy(CRYPTO_QUANTITY_DP, RoundingStrategy::ToZero)
        }
    }
}

//! Stop-loss, take-profit and trailing stop levels

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::types::{AssetClass, Side};
use crate::config::RiskConfig;

/// Why an open position should be closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLossHit,
    TakeProfitHit,
}

fn pct(percent: Decimal) -> Decimal {
    percent / dec!(100)
}

/// Default stop price for an entry, using the asset class's stop percent
pub fn default_stop_loss(
    entry_price: Decimal,
    side: Side,
    asset_class: AssetClass,
    config: &RiskConfig,
) -> Decimal {
    let distance = entry_price * pct(config.stop_loss_percent_for(asset_class));
    match side {
        Side::Buy => entry_price - distance,
        Side::Sell => entry_price + distance,
    }
}

/// Default target: the stop distance scaled by take_profit / stop_loss percent.
/// `None` if the target falls outside the decimal range.
pub fn default_take_profit(
    entry_price: Decimal,
    stop_loss_price: Decimal,
    side: Side,
    asset_class: AssetClass,
    config: &RiskConfig,
) -> Option<Decimal> {
    let ratio = config
        .take_profit_percent_for(asset_class)
        .checked_div(config.stop_loss_percent_for(asset_class))?;
    let distance = (entry_price - stop_loss_price).abs().checked_mul(ratio)?;
    match side {
        Side::Buy => entry_price.checked_add(distance),
        Side::Sell => Some((entry_price - distance).max(Decimal::ZERO)),
    }
}

/// Trailing stop below the best price for longs, above it for shorts
pub fn trailing_stop(
    best_price: Decimal,
    side: Side,
    asset_class: AssetClass,
    config: &RiskConfig,
) -> Decimal {
    let trail = pct(config.trailing_stop_percent_for(asset_class));
    match side {
        Side::Buy => best_price * (Decimal::ONE - trail),
        Side::Sell => best_price * (Decimal::ONE + trail),
    }
}

/// Check a price against stop and target levels
pub fn exit_signal(
    side: Side,
    stop_loss_price: Decimal,
    take_profit_price: Decimal,
    current_price: Decimal,
) -> Option<ExitReason> {
    match side {
        Side::Buy if current_price <= stop_loss_price => Some(ExitReason::StopLossHit),
        Side::Buy if current_price >= take_profit_price => Some(ExitReason::TakeProfitHit),
        Side::Sell if current_price >= stop_loss_price => Some(ExitReason::StopLossHit),
        Side::Sell if current_price <= take_profit_price => Some(ExitReason::TakeProfitHit),
        _ => None,
    }
}

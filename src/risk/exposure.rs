//! Open exposure tracking

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::stops::{self, ExitReason};
use super::types::{AssetClass, RejectionReason, Side, TradeRiskAssessment};

/// Position identifier
pub type PositionId = Uuid;

/// An executed, still-open position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub id: PositionId,
    pub symbol: String,
    pub side: Side,
    pub asset_class: AssetClass,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub notional: Decimal,
    pub stop_loss_price: Decimal,
    pub take_profit_price: Decimal,
    pub entry_time: DateTime<Utc>,
}

/// A closed position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub position: OpenPosition,
    pub realized_pnl: Decimal,
    pub exit_time: DateTime<Utc>,
}

/// Tracks count and aggregate notional of open positions
#[derive(Debug, Clone, Default)]
pub struct ExposureTracker {
    open_positions: HashMap<PositionId, OpenPosition>,
    open_notional: Decimal,
}

impl ExposureTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            open_positions: HashMap::new(),
            open_notional: dec!(0),
        }
    }

    /// Reject when no position slot is free
    pub fn check_capacity(&self, max_positions: usize) -> Result<(), RejectionReason> {
        let open = self.open_count();
        if open >= max_positions {
            return Err(RejectionReason::MaxPositionsExceeded {
                open,
                max: max_positions,
            });
        }
        Ok(())
    }

    /// Reject when the symbol already has an open position
    pub fn check_symbol(&self, symbol: &str) -> Result<(), RejectionReason> {
        if self.has_position(symbol) {
            return Err(RejectionReason::PositionAlreadyOpen(symbol.to_string()));
        }
        Ok(())
    }

    /// Open a position for an executed assessment
    pub fn open(&mut self, assessment: &TradeRiskAssessment, at: DateTime<Utc>) -> PositionId {
        let position = OpenPosition {
            id: Uuid::new_v4(),
            symbol: assessment.symbol.clone(),
            side: assessment.side,
            asset_class: assessment.asset_class,
            entry_price: assessment.entry_price,
            size: assessment.position_size,
            notional: assessment.notional_value,
            stop_loss_price: assessment.stop_loss_price,
            take_profit_price: assessment.take_profit_price,
            entry_time: at,
        };

        let id = position.id;
        self.open_notional += position.notional;
        self.open_positions.insert(id, position);
        id
    }

    /// Close a position by id
    pub fn close(
        &mut self,
        position_id: PositionId,
        realized_pnl: Decimal,
        at: DateTime<Utc>,
    ) -> Option<ClosedPosition> {
        let position = self.open_positions.remove(&position_id)?;
        self.open_notional -= position.notional;

        Some(ClosedPosition {
            position,
            realized_pnl,
            exit_time: at,
        })
    }

    /// Close the oldest open position in a symbol
    pub fn close_symbol(
        &mut self,
        symbol: &str,
        realized_pnl: Decimal,
        at: DateTime<Utc>,
    ) -> Option<ClosedPosition> {
        let id = self
            .open_positions
            .values()
            .filter(|p| p.symbol == symbol)
            .min_by_key(|p| p.entry_time)
            .map(|p| p.id)?;
        self.close(id, realized_pnl, at)
    }

    /// Exit check for the oldest open position in a symbol
    pub fn check_exit(&self, symbol: &str, current_price: Decimal) -> Option<ExitReason> {
        let position = self
            .open_positions
            .values()
            .filter(|p| p.symbol == symbol)
            .min_by_key(|p| p.entry_time)?;
        stops::exit_signal(
            position.side,
            position.stop_loss_price,
            position.take_profit_price,
            current_price,
        )
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.open_positions.values().any(|p| p.symbol == symbol)
    }

    /// Get number of open positions
    pub fn open_count(&self) -> usize {
        self.open_positions.len()
    }

    /// Aggregate notional of open positions
    pub fn open_notional(&self) -> Decimal {
        self.open_notional
    }

    pub fn positions(&self) -> impl Iterator<Item = &OpenPosition> {
        self.open_positions.values()
    }
}

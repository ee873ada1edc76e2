//! Order bookkeeping.
//!
//! An [`Order`] is the execution core's own record of a leg dispatched to
//! a broker adapter — distinct from [`fulcrum_markets::OrderIntent`], which
//! is the wire-shaped request an adapter call actually receives.

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use fulcrum_markets::{AccountId, Id, OrderType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

pub struct OrderTag;
pub type OrderId = Id<OrderTag>;

/// Identifies the [`crate::registry`]'d-through [`ExecutionRun`] a leg
/// belongs to. Defined here (rather than in `fulcrum-core`, which owns
/// `ExecutionRun` itself) so this crate never needs to depend back on
/// `fulcrum-core`.
pub struct ExecutionRunTag;
pub type ExecutionRunId = Id<ExecutionRunTag>;

pub struct StrategyRunTag;
pub type StrategyRunId = Id<StrategyRunTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Requested,
    Accepted,
    Rejected,
    Filled,
    PartiallyFilled,
    Cancelled,
    Error,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Filled | Self::Cancelled | Self::Error
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Constructor)]
pub struct Order {
    pub id: OrderId,
    pub execution_run: ExecutionRunId,
    pub strategy_run: Option<StrategyRunId>,
    pub account: AccountId,
    pub broker_order_id: Option<SmolStr>,
    pub symbol: SmolStr,
    pub side: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub price: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn mark(&mut self, status: OrderStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_match_spec_leg_outcomes() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Error.is_terminal());
        assert!(!OrderStatus::Requested.is_terminal());
        assert!(!OrderStatus::Accepted.is_terminal());
    }
}

//! A closed trade's realised PnL contribution — the "Position/PnL
//! projection" spec.md's Analytics Aggregator reads alongside the Event
//! Store. Produced upstream of this crate (wherever a leg's fill price is
//! known); this crate only aggregates.

use chrono::{DateTime, Utc};
use fulcrum_core::ExecutionRunId;
use fulcrum_trader::StrategyId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub run: ExecutionRunId,
    pub strategy: Option<StrategyId>,
    pub symbol: SmolStr,
    pub realized_pnl: Decimal,
    pub closed_at: DateTime<Utc>,
}

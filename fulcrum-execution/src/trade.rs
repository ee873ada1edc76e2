use chrono::{DateTime, Utc};
use derive_more::Constructor;
use fulcrum_markets::Id;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::OrderId;

pub struct TradeTag;
pub type TradeId = Id<TradeTag>;

/// A realised fill attached to an [`crate::order::Order`]. An order may
/// accumulate more than one `Trade` under partial fills.
#[derive(Debug, Clone, Serialize, Deserialize, Constructor)]
pub struct Trade {
    pub id: TradeId,
    pub order: OrderId,
    pub quantity: Decimal,
    pub price: Decimal,
    pub realised_pnl: Decimal,
    pub time: DateTime<Utc>,
}

//! Flattening an open position into a market order to close it — ported
//! from the teacher's `ClosePositionsStrategy` and
//! `build_ioc_market_order_to_close_position`, regrounded from its
//! `OrderRequestOpen`/`OrderKey` wire shape onto this workspace's
//! `TradeIntent`.

use fulcrum_core::TradeIntent;
use fulcrum_markets::{BrokerPosition, OrderType, Side};
use itertools::Itertools;
use rust_decimal::Decimal;

pub trait ClosePositionsStrategy: Send + Sync {
    type State;

    /// Given the live positions snapshot, yields the `TradeIntent`s that
    /// would flatten every open position this strategy owns.
    fn close_positions_requests<'a>(&'a self, state: &'a Self::State, positions: &'a [BrokerPosition]) -> Vec<TradeIntent>;
}

/// Builds a `TradeIntent` that flattens one open position with an
/// immediate market order on the opposite side, at the given lot size.
/// Returns `None` for a flat position (`net_qty == 0`).
pub fn build_market_order_to_close_position(position: &BrokerPosition, lot_size: u64) -> Option<TradeIntent> {
    if position.net_qty.is_zero() || lot_size == 0 {
        return None;
    }
    let side = if position.net_qty.is_sign_positive() { Side::Sell } else { Side::Buy };
    let total_lots = (position.net_qty.abs() / Decimal::from(lot_size))
        .round()
        .to_string()
        .parse()
        .unwrap_or(0);
    if total_lots == 0 {
        return None;
    }
    Some(TradeIntent {
        symbol: position.symbol.clone(),
        exchange: None,
        token: None,
        side,
        total_lots,
        lot_size,
        order_type: OrderType::Market,
        price: None,
        take_profit: None,
        stop_loss: None,
    })
}

/// Flattens every non-flat position in `positions` at the given `lot_size`.
pub fn close_open_positions_with_market_orders(positions: &[BrokerPosition], lot_size: u64) -> Vec<TradeIntent> {
    positions
        .iter()
        .filter_map(|position| build_market_order_to_close_position(position, lot_size))
        .collect_vec()
}

//! Buys once on the first snapshot seen and never trades again —
//! the simplest possible reference strategy, used mainly to exercise the
//! Strategy Runner's plumbing end to end.

use fulcrum_core::TradeIntent;
use fulcrum_markets::{OrderType, Side};
use smol_str::SmolStr;

use crate::algo::{AlgoStrategy, MarketSnapshot};

#[derive(Debug, Default, Clone)]
pub struct BuyAndHoldState {
    bought: bool,
}

#[derive(Debug, Clone)]
pub struct BuyAndHoldStrategy {
    pub symbol: SmolStr,
    pub total_lots: u64,
    pub lot_size: u64,
}

impl AlgoStrategy for BuyAndHoldStrategy {
    type State = BuyAndHoldState;

    fn on_snapshot(&self, state: &mut Self::State, snapshot: &MarketSnapshot) -> Option<TradeIntent> {
        if state.bought {
            return None;
        }
        state.bought = true;
        Some(TradeIntent {
            symbol: self.symbol.clone(),
            exchange: None,
            token: None,
            side: Side::Buy,
            total_lots: self.total_lots,
            lot_size: self.lot_size,
            order_type: OrderType::Market,
            price: Some(snapshot.price),
            take_profit: None,
            stop_loss: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn buys_once_and_then_never_again() {
        let strategy = BuyAndHoldStrategy { symbol: "NIFTY".into(), total_lots: 2, lot_size: 50 };
        let mut state = BuyAndHoldState::default();
        let snapshot = MarketSnapshot { price: dec!(100), timestamp: Utc::now() };

        let first = strategy.on_snapshot(&mut state, &snapshot);
        assert!(first.is_some());
        assert_eq!(first.unwrap().side, Side::Buy);

        let second = strategy.on_snapshot(&mut state, &snapshot);
        assert!(second.is_none());
    }
}

//! Emits a market order each time price crosses a configured threshold,
//! flipping side on every crossing — grounded in the teacher's
//! `OrderBookImbalanceStrategy` (a `Config`/`State` pair comparing a live
//! signal against a configured threshold).

use fulcrum_core::TradeIntent;
use fulcrum_markets::{OrderType, Side};
use rust_decimal::Decimal;
use smol_str::SmolStr;

use crate::algo::{AlgoStrategy, MarketSnapshot};

#[derive(Debug, Clone)]
pub struct ThresholdCrossConfig {
    pub symbol: SmolStr,
    pub threshold: Decimal,
    pub total_lots: u64,
    pub lot_size: u64,
}

#[derive(Debug, Default, Clone)]
pub struct ThresholdCrossState {
    last_side: Option<Side>,
}

pub struct ThresholdCrossStrategy {
    pub config: ThresholdCrossConfig,
}

impl ThresholdCrossStrategy {
    pub fn new(config: ThresholdCrossConfig) -> Self {
        Self { config }
    }
}

impl AlgoStrategy for ThresholdCrossStrategy {
    type State = ThresholdCrossState;

    fn on_snapshot(&self, state: &mut Self::State, snapshot: &MarketSnapshot) -> Option<TradeIntent> {
        let side = if snapshot.price >= self.config.threshold { Side::Buy } else { Side::Sell };
        if state.last_side == Some(side) {
            return None;
        }
        state.last_side = Some(side);
        Some(TradeIntent {
            symbol: self.config.symbol.clone(),
            exchange: None,
            token: None,
            side,
            total_lots: self.config.total_lots,
            lot_size: self.config.lot_size,
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

    fn snapshot(price: Decimal) -> MarketSnapshot {
        MarketSnapshot { price, timestamp: Utc::now() }
    }

    #[test]
    fn emits_on_crossing_and_suppresses_repeats() {
        let strategy = ThresholdCrossStrategy::new(ThresholdCrossConfig {
            symbol: "BANKNIFTY".into(),
            threshold: dec!(100),
            total_lots: 1,
            lot_size: 25,
        });
        let mut state = ThresholdCrossState::default();

        let first = strategy.on_snapshot(&mut state, &snapshot(dec!(105)));
        assert_eq!(first.unwrap().side, Side::Buy);

        let repeat = strategy.on_snapshot(&mut state, &snapshot(dec!(110)));
        assert!(repeat.is_none());

        let crossed = strategy.on_snapshot(&mut state, &snapshot(dec!(95)));
        assert_eq!(crossed.unwrap().side, Side::Sell);
    }
}

//! Open-position snapshot with mark-to-market unrealised PnL (spec.md
//! §4.9).

use std::collections::HashMap;

use fulcrum_markets::BrokerPosition;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: SmolStr,
    pub net_qty: Decimal,
    pub avg_price: Decimal,
    pub last_price: Option<Decimal>,
    pub unrealized_pnl: Option<Decimal>,
}

/// Marks `positions` to `last_prices` (keyed by symbol); a position whose
/// symbol has no quoted price yields `unrealized_pnl: None` rather than
/// silently treating it as flat.
pub fn snapshot(positions: &[BrokerPosition], last_prices: &HashMap<SmolStr, Decimal>) -> Vec<OpenPosition> {
    positions
        .iter()
        .map(|position| {
            let last_price = last_prices.get(&position.symbol).copied();
            let unrealized_pnl = last_price.map(|price| position.net_qty * (price - position.avg_price));
            OpenPosition {
                symbol: position.symbol.clone(),
                net_qty: position.net_qty,
                avg_price: position.avg_price,
                last_price,
                unrealized_pnl,
            }
        })
        .collect()
}

/// Total unrealised PnL across all positions with a known last price.
pub fn total_unrealized_pnl(positions: &[OpenPosition]) -> Decimal {
    positions.iter().filter_map(|position| position.unrealized_pnl).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn marks_a_long_position_to_a_higher_last_price_as_a_gain() {
        let positions = vec![BrokerPosition { symbol: "NIFTY".into(), net_qty: dec!(50), avg_price: dec!(100) }];
        let mut prices = HashMap::new();
        prices.insert(SmolStr::from("NIFTY"), dec!(110));

        let snap = snapshot(&positions, &prices);
        assert_eq!(snap[0].unrealized_pnl, Some(dec!(500)));
    }

    #[test]
    fn an_unquoted_symbol_has_no_unrealized_pnl() {
        let positions = vec![BrokerPosition { symbol: "BANKNIFTY".into(), net_qty: dec!(25), avg_price: dec!(200) }];
        let snap = snapshot(&positions, &HashMap::new());
        assert_eq!(snap[0].unrealized_pnl, None);
        assert_eq!(total_unrealized_pnl(&snap), dec!(0));
    }
}

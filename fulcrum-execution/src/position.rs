//! Per-(account, symbol) rolling position, materialised from [`Trade`]s.

use fulcrum_markets::{AccountId, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::trade::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub account: AccountId,
    pub symbol: SmolStr,
    pub net_qty: Decimal,
    pub avg_price: Decimal,
    pub realised_pnl: Decimal,
}

impl Position {
    pub fn flat(account: AccountId, symbol: SmolStr) -> Self {
        Self {
            account,
            symbol,
            net_qty: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            realised_pnl: Decimal::ZERO,
        }
    }

    /// Applies a fill using the average-cost method: a trade that extends
    /// the existing side re-weights `avg_price`; a trade against it reduces
    /// `net_qty` and realises pnl on the reduced amount, only updating
    /// `avg_price` if the position flips sign.
    pub fn apply_trade(&mut self, side: Side, trade: &Trade) {
        let signed_qty = match side {
            Side::Buy => trade.quantity,
            Side::Sell => -trade.quantity,
        };

        let same_direction = self.net_qty == Decimal::ZERO
            || (self.net_qty > Decimal::ZERO) == (signed_qty > Decimal::ZERO);

        if same_direction {
            let total_qty = self.net_qty + signed_qty;
            if total_qty != Decimal::ZERO {
                self.avg_price = ((self.avg_price * self.net_qty.abs())
                    + (trade.price * signed_qty.abs()))
                    / total_qty.abs();
            }
            self.net_qty = total_qty;
        } else {
            let closing_qty = signed_qty.abs().min(self.net_qty.abs());
            let pnl_sign = if self.net_qty > Decimal::ZERO {
                Decimal::ONE
            } else {
                -Decimal::ONE
            };
            self.realised_pnl += pnl_sign * (trade.price - self.avg_price) * closing_qty;
            self.net_qty += signed_qty;

            if self.net_qty != Decimal::ZERO
                && (self.net_qty > Decimal::ZERO) != (pnl_sign > Decimal::ZERO)
            {
                // Position flipped sign: the remainder opens a new position
                // at the trade price.
                self.avg_price = trade.price;
            } else if self.net_qty == Decimal::ZERO {
                self.avg_price = Decimal::ZERO;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulcrum_markets::Id;
    use rust_decimal_macros::dec;

    fn trade(qty: Decimal, price: Decimal) -> Trade {
        Trade::new(
            Id::new(),
            Id::new(),
            qty,
            price,
            Decimal::ZERO,
            chrono::Utc::now(),
        )
    }

    #[test]
    fn opening_then_adding_reweights_average_price() {
        let mut pos = Position::flat(Id::new(), "NIFTY".into());
        pos.apply_trade(Side::Buy, &trade(dec!(10), dec!(100)));
        assert_eq!(pos.net_qty, dec!(10));
        assert_eq!(pos.avg_price, dec!(100));

        pos.apply_trade(Side::Buy, &trade(dec!(10), dec!(120)));
        assert_eq!(pos.net_qty, dec!(20));
        assert_eq!(pos.avg_price, dec!(110));
    }

    #[test]
    fn partial_close_realises_pnl_on_closed_quantity_only() {
        let mut pos = Position::flat(Id::new(), "NIFTY".into());
        pos.apply_trade(Side::Buy, &trade(dec!(10), dec!(100)));
        pos.apply_trade(Side::Sell, &trade(dec!(4), dec!(130)));

        assert_eq!(pos.net_qty, dec!(6));
        assert_eq!(pos.avg_price, dec!(100));
        assert_eq!(pos.realised_pnl, dec!(120));
    }

    #[test]
    fn flipping_through_flat_opens_fresh_position_at_trade_price() {
        let mut pos = Position::flat(Id::new(), "NIFTY".into());
        pos.apply_trade(Side::Buy, &trade(dec!(5), dec!(100)));
        pos.apply_trade(Side::Sell, &trade(dec!(8), dec!(90)));

        assert_eq!(pos.net_qty, dec!(-3));
        assert_eq!(pos.avg_price, dec!(90));
        assert_eq!(pos.realised_pnl, dec!(-50));
    }
}

//! The mandatory, deterministic `PaperTrading` adapter (spec.md §4.1).
//!
//! Accepts every order, assigns synthetic broker order ids, fills `MARKET`
//! orders immediately at the intent price (or a configured reference
//! price when the intent carries none), and tracks positions/trades
//! in-process. This is the reference implementation every orchestrator
//! integration test runs against.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use fulcrum_markets::{
    AccountProvider, Broker, BrokerError, BrokerHolding, BrokerKind, BrokerPosition,
    BrokerSession, MarginSnapshot, OrderExecutor, OrderIntent, OrderPatch, OrderType, Side,
};
use rust_decimal::Decimal;
use smol_str::SmolStr;

/// Reference price used to fill a `MARKET` order whose intent carries no
/// price (spec.md §4.1: "fills MARKET immediately at the intent price, or
/// a configured reference price").
#[derive(Debug, Clone, Copy)]
pub struct ReferencePrice(pub Decimal);

#[derive(Debug)]
pub struct PaperTrading {
    reference_price: ReferencePrice,
    next_order_id: AtomicU64,
    positions: DashMap<SmolStr, BrokerPosition>,
    margin: MarginSnapshot,
}

impl PaperTrading {
    pub fn new(reference_price: ReferencePrice, starting_margin: MarginSnapshot) -> Self {
        Self {
            reference_price,
            next_order_id: AtomicU64::new(1),
            positions: DashMap::new(),
            margin: starting_margin,
        }
    }

    fn fill_price(&self, intent: &OrderIntent) -> Decimal {
        intent.price.unwrap_or(self.reference_price.0)
    }

    fn apply_fill(&self, intent: &OrderIntent, fill_price: Decimal) {
        let mut entry = self
            .positions
            .entry(intent.symbol.clone())
            .or_insert_with(|| BrokerPosition {
                symbol: intent.symbol.clone(),
                net_qty: Decimal::ZERO,
                avg_price: Decimal::ZERO,
            });

        let signed_qty = match intent.side {
            Side::Buy => intent.quantity,
            Side::Sell => -intent.quantity,
        };
        let total_qty = entry.net_qty + signed_qty;
        if total_qty != Decimal::ZERO
            && (entry.net_qty == Decimal::ZERO || (entry.net_qty > Decimal::ZERO) == (signed_qty > Decimal::ZERO))
        {
            entry.avg_price = ((entry.avg_price * entry.net_qty.abs())
                + (fill_price * signed_qty.abs()))
                / total_qty.abs();
        } else if total_qty == Decimal::ZERO {
            entry.avg_price = Decimal::ZERO;
        }
        entry.net_qty = total_qty;
    }
}

impl Broker for PaperTrading {
    fn kind(&self) -> BrokerKind {
        BrokerKind::PaperTrading
    }
}

#[async_trait]
impl OrderExecutor for PaperTrading {
    async fn connect(
        &self,
        _credentials: &fulcrum_markets::BrokerCredentials,
    ) -> Result<BrokerSession, BrokerError> {
        Ok(BrokerSession {
            token: SmolStr::new("paper-session"),
            expires_at: Utc::now() + chrono::Duration::hours(24),
        })
    }

    async fn refresh(&self, session: &BrokerSession) -> Result<BrokerSession, BrokerError> {
        Ok(BrokerSession {
            token: session.token.clone(),
            expires_at: Utc::now() + chrono::Duration::hours(24),
        })
    }

    async fn logout(&self, _session: &BrokerSession) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn place(
        &self,
        _session: &BrokerSession,
        order: &OrderIntent,
    ) -> Result<SmolStr, BrokerError> {
        let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        let broker_order_id = SmolStr::new(format!("PAPER-{id}"));

        if order.order_type == OrderType::Market {
            let fill_price = self.fill_price(order);
            self.apply_fill(order, fill_price);
        }

        Ok(broker_order_id)
    }

    async fn modify(
        &self,
        _session: &BrokerSession,
        _broker_order_id: &str,
        _patch: &OrderPatch,
    ) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn cancel(
        &self,
        _session: &BrokerSession,
        _broker_order_id: &str,
    ) -> Result<(), BrokerError> {
        Ok(())
    }
}

#[async_trait]
impl AccountProvider for PaperTrading {
    async fn positions(&self, _session: &BrokerSession) -> Result<Vec<BrokerPosition>, BrokerError> {
        Ok(self
            .positions
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn holdings(&self, _session: &BrokerSession) -> Result<Vec<BrokerHolding>, BrokerError> {
        Ok(Vec::new())
    }

    async fn margin(&self, _session: &BrokerSession) -> Result<MarginSnapshot, BrokerError> {
        Ok(self.margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn intent(side: Side, qty: Decimal, price: Option<Decimal>) -> OrderIntent {
        OrderIntent {
            symbol: "NIFTY".into(),
            exchange: None,
            side,
            quantity: qty,
            order_type: OrderType::Market,
            price,
            take_profit: None,
            stop_loss: None,
            client_order_id: "c1".into(),
        }
    }

    #[tokio::test]
    async fn market_order_fills_immediately_at_intent_price() {
        let paper = PaperTrading::new(
            ReferencePrice(dec!(100)),
            MarginSnapshot {
                available: dec!(100000),
                used: dec!(0),
            },
        );
        let session = paper
            .connect(&fulcrum_markets::BrokerCredentials {
                client_code: "x".into(),
                api_key: "x".into(),
                api_secret: "x".into(),
                totp_seed: None,
            })
            .await
            .unwrap();

        let id = paper
            .place(&session, &intent(Side::Buy, dec!(10), Some(dec!(150))))
            .await
            .unwrap();
        assert!(id.starts_with("PAPER-"));

        let positions = paper.positions(&session).await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].net_qty, dec!(10));
        assert_eq!(positions[0].avg_price, dec!(150));
    }

    #[tokio::test]
    async fn falls_back_to_reference_price_when_intent_has_none() {
        let paper = PaperTrading::new(
            ReferencePrice(dec!(42)),
            MarginSnapshot {
                available: dec!(100000),
                used: dec!(0),
            },
        );
        let session = paper
            .connect(&fulcrum_markets::BrokerCredentials {
                client_code: "x".into(),
                api_key: "x".into(),
                api_secret: "x".into(),
                totp_seed: None,
            })
            .await
            .unwrap();

        paper
            .place(&session, &intent(Side::Buy, dec!(1), None))
            .await
            .unwrap();

        let positions = paper.positions(&session).await.unwrap();
        assert_eq!(positions[0].avg_price, dec!(42));
    }
}

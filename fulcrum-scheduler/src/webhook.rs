//! Webhook Ingress (spec.md §3, §4.8): authenticates a connector by
//! constant-time token comparison, runs the connector's declarative
//! transform over the delivered payload, and triggers the bound Strategy
//! exactly once per distinct delivery.

use std::collections::HashMap;

use fulcrum_core::TradeIntent;
use fulcrum_trader::StrategyId;
use fulcrum_markets::Id;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub struct ConnectorTag;
pub type ConnectorId = Id<ConnectorTag>;

/// One declarative mapping step: copy `source` (a dotted JSON path into
/// the delivered payload) into `field` (a `TradeIntent` field name).
/// Deliberately data, not code — the transform is configured per
/// connector, never a user-supplied script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: SmolStr,
    pub source: SmolStr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConnector {
    pub id: ConnectorId,
    pub user: fulcrum_markets::UserId,
    pub token: SmolStr,
    pub strategy: StrategyId,
    pub transform: Vec<FieldMapping>,
    pub enabled: bool,
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("connector is disabled")]
    Disabled,
    #[error("token mismatch")]
    Unauthorized,
    #[error("transform field {0:?} has no matching source in payload")]
    MissingField(SmolStr),
    #[error("transform produced an invalid trade intent: {0}")]
    InvalidIntent(String),
}

impl WebhookConnector {
    /// Constant-time token comparison — a timing side channel here would
    /// let an attacker recover valid webhook tokens byte by byte.
    pub fn authenticate(&self, presented_token: &str) -> Result<(), WebhookError> {
        if !self.enabled {
            return Err(WebhookError::Disabled);
        }
        let expected = self.token.as_bytes();
        let presented = presented_token.as_bytes();
        if expected.len() != presented.len() || !bool::from(expected.ct_eq(presented)) {
            return Err(WebhookError::Unauthorized);
        }
        Ok(())
    }

    /// Applies this connector's field mappings to a flat JSON payload,
    /// producing a `TradeIntent`. `source` paths index into a flattened
    /// top-level object — nested-path transforms are out of scope.
    pub fn transform(&self, payload: &serde_json::Value) -> Result<TradeIntent, WebhookError> {
        let mut fields: HashMap<&str, &serde_json::Value> = HashMap::new();
        for mapping in &self.transform {
            let value = payload
                .get(mapping.source.as_str())
                .ok_or_else(|| WebhookError::MissingField(mapping.source.clone()))?;
            fields.insert(mapping.field.as_str(), value);
        }

        let get_str = |key: &str| -> Option<SmolStr> { fields.get(key).and_then(|v| v.as_str()).map(SmolStr::from) };
        let get_u64 = |key: &str| -> Option<u64> { fields.get(key).and_then(|v| v.as_u64()) };
        let get_decimal = |key: &str| -> Option<rust_decimal::Decimal> {
            fields.get(key).and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_f64().and_then(rust_decimal::Decimal::from_f64_retain)))
        };

        let symbol = get_str("symbol").ok_or_else(|| WebhookError::MissingField("symbol".into()))?;
        let side = match get_str("side").as_deref() {
            Some("buy") | Some("BUY") => fulcrum_markets::Side::Buy,
            Some("sell") | Some("SELL") => fulcrum_markets::Side::Sell,
            _ => return Err(WebhookError::MissingField("side".into())),
        };
        let total_lots = get_u64("total_lots").ok_or_else(|| WebhookError::MissingField("total_lots".into()))?;
        let lot_size = get_u64("lot_size").unwrap_or(1);
        let order_type = match get_str("order_type").as_deref() {
            Some("limit") | Some("LIMIT") => fulcrum_markets::OrderType::Limit,
            _ => fulcrum_markets::OrderType::Market,
        };

        let intent = TradeIntent {
            symbol,
            exchange: get_str("exchange"),
            token: get_str("token"),
            side,
            total_lots,
            lot_size,
            order_type,
            price: get_decimal("price"),
            take_profit: get_decimal("take_profit"),
            stop_loss: get_decimal("stop_loss"),
        };
        intent.validate().map_err(|error| WebhookError::InvalidIntent(error.to_string()))?;
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(token: &str) -> WebhookConnector {
        WebhookConnector {
            id: Id::new(),
            user: Id::new(),
            token: token.into(),
            strategy: Id::new(),
            transform: vec![
                FieldMapping { field: "symbol".into(), source: "sym".into() },
                FieldMapping { field: "side".into(), source: "direction".into() },
                FieldMapping { field: "total_lots".into(), source: "qty".into() },
            ],
            enabled: true,
        }
    }

    #[test]
    fn authenticate_rejects_wrong_token_and_accepts_right_one() {
        let connector = connector("s3cret");
        assert!(connector.authenticate("wrong").is_err());
        assert!(connector.authenticate("s3cret").is_ok());
    }

    #[test]
    fn disabled_connector_never_authenticates() {
        let mut connector = connector("s3cret");
        connector.enabled = false;
        assert!(matches!(connector.authenticate("s3cret"), Err(WebhookError::Disabled)));
    }

    #[test]
    fn transform_maps_payload_fields_into_a_trade_intent() {
        let connector = connector("s3cret");
        let payload = serde_json::json!({ "sym": "NIFTY", "direction": "buy", "qty": 2 });
        let intent = connector.transform(&payload).unwrap();
        assert_eq!(intent.symbol.as_str(), "NIFTY");
        assert_eq!(intent.side, fulcrum_markets::Side::Buy);
        assert_eq!(intent.total_lots, 2);
    }

    #[test]
    fn transform_rejects_a_payload_missing_a_mapped_field() {
        let connector = connector("s3cret");
        let payload = serde_json::json!({ "sym": "NIFTY" });
        assert!(connector.transform(&payload).is_err());
    }
}

//! Core broker traits
//!
//! Defines the narrow capability contract every broker adapter must
//! satisfy (spec.md §4.1): connect/refresh/logout session lifecycle, order
//! placement/modification/cancellation, and account queries. Broker-specific
//! quirks (TOTP, extra headers, position-conversion verbs) are kept out of
//! this trait and pushed into per-adapter option structs, per spec.md §9.

use crate::id::Id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Debug;

/// Identifies which broker family an adapter talks to. The registry
/// (`fulcrum-execution::registry`) maps this symbol to a factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BrokerKind {
    Zerodha,
    Upstox,
    AngelOne,
    /// Mandatory, deterministic reference adapter (spec.md §4.1).
    PaperTrading,
    Custom(SmolStr),
}

impl std::fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zerodha => write!(f, "zerodha"),
            Self::Upstox => write!(f, "upstox"),
            Self::AngelOne => write!(f, "angel_one"),
            Self::PaperTrading => write!(f, "paper_trading"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Broker-specific error types surfaced by adapter calls.
///
/// These map onto the `BrokerSession`/`BrokerRejected`/`AdapterTransport`
/// error kinds in spec.md §7; the orchestrator is responsible for that
/// mapping, this crate only distinguishes the raw causes.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum BrokerError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("session expired")]
    SessionExpired,

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("adapter call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("internal adapter error: {0}")]
    Internal(String),
}

/// Marker type for [`Id`] tags — a `BrokerLink` groups credentials and a
/// session under one user; `Account` is a child of a `BrokerLink`.
pub struct BrokerLinkTag;
pub type BrokerLinkId = Id<BrokerLinkTag>;

pub struct AccountTag;
pub type AccountId = Id<AccountTag>;

pub struct UserTag;
pub type UserId = Id<UserTag>;

/// Session handle returned by [`Broker::connect`]. Carries an expiry so the
/// registry can detect staleness without an extra round trip (spec.md §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerSession {
    pub token: SmolStr,
    pub expires_at: DateTime<Utc>,
}

impl BrokerSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Opaque encrypted credential bundle as stored by the vault. The adapter
/// never sees this type directly — only the decrypted [`BrokerCredentials`]
/// handed to it for the duration of a single call (spec.md §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedCredentials {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Decrypted broker credentials, alive only on the stack during one
/// adapter call frame (spec.md §4.2's at-rest-encryption invariant).
#[derive(Clone, Serialize, Deserialize)]
pub struct BrokerCredentials {
    pub client_code: SmolStr,
    pub api_key: SmolStr,
    pub api_secret: SmolStr,
    pub totp_seed: Option<SmolStr>,
}

impl Debug for BrokerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("client_code", &self.client_code)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("totp_seed", &self.totp_seed.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Minimal order-placement contract understood by every adapter. Higher
/// layers (allocation/RMS) translate a `TradeIntent` leg into this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: SmolStr,
    pub exchange: Option<SmolStr>,
    pub side: Side,
    pub quantity: Decimal,
    pub order_type: OrderType,
    pub price: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub client_order_id: SmolStr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPatch {
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub symbol: SmolStr,
    pub net_qty: Decimal,
    pub avg_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerHolding {
    pub symbol: SmolStr,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarginSnapshot {
    pub available: Decimal,
    pub used: Decimal,
}

/// Identity + connectivity metadata common to every broker adapter.
pub trait Broker: Debug + Send + Sync {
    fn kind(&self) -> BrokerKind;
}

/// Order-placement capability. This is the hot path the Orchestrator
/// dispatches legs through (spec.md §4.1, §4.5).
#[async_trait]
pub trait OrderExecutor: Broker {
    async fn connect(&self, credentials: &BrokerCredentials) -> Result<BrokerSession, BrokerError>;

    async fn refresh(&self, session: &BrokerSession) -> Result<BrokerSession, BrokerError>;

    async fn logout(&self, session: &BrokerSession) -> Result<(), BrokerError>;

    async fn place(
        &self,
        session: &BrokerSession,
        order: &OrderIntent,
    ) -> Result<SmolStr, BrokerError>;

    async fn modify(
        &self,
        session: &BrokerSession,
        broker_order_id: &str,
        patch: &OrderPatch,
    ) -> Result<(), BrokerError>;

    async fn cancel(&self, session: &BrokerSession, broker_order_id: &str)
        -> Result<(), BrokerError>;
}

/// Account/position query capability.
#[async_trait]
pub trait AccountProvider: Broker {
    async fn positions(&self, session: &BrokerSession) -> Result<Vec<BrokerPosition>, BrokerError>;

    async fn holdings(&self, session: &BrokerSession) -> Result<Vec<BrokerHolding>, BrokerError>;

    async fn margin(&self, session: &BrokerSession) -> Result<MarginSnapshot, BrokerError>;
}

/// Full broker implementation combining both capabilities. Every adapter
/// registered with `fulcrum-execution::registry::BrokerRegistry` implements
/// this.
pub trait FullBroker: OrderExecutor + AccountProvider {}
impl<T: OrderExecutor + AccountProvider> FullBroker for T {}

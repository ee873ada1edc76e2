#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Markets — domain identifiers and the broker capability contract
//!
//! The narrowest, most widely depended-on crate in the Fulcrum workspace.
//! Everything else — execution, risk, allocation, the orchestrator, the
//! strategy runner — shares the [`id::Id`] opaque-identifier type and the
//! [`broker::Broker`] trait family defined here.

/// Opaque phantom-tagged 128-bit identifiers.
pub mod id;

/// Broker capability traits, session types, and the broker-kind registry
/// key.
pub mod broker;

pub use broker::{
    AccountId, AccountProvider, Broker, BrokerCredentials, BrokerError, BrokerHolding, BrokerKind,
    BrokerLinkId, BrokerPosition, BrokerSession, EncryptedCredentials, FullBroker,
    MarginSnapshot, OrderExecutor, OrderIntent, OrderPatch, OrderType, Side, UserId,
};
pub use id::Id;

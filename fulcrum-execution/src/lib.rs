#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Execution — broker adapters, credential vault, order/trade bookkeeping
//!
//! The Broker Adapter Registry (spec.md §4.1) and Credential Vault
//! (§4.2): the layer the Orchestrator (`fulcrum-core`) dispatches legs
//! through. Every broker, including the mandatory [`paper::PaperTrading`]
//! reference adapter, implements [`fulcrum_markets::FullBroker`] and is
//! reached only via [`registry::BrokerRegistry`] — nothing outside this
//! crate holds a raw adapter handle or a decrypted credential.

pub mod balance;
pub mod error;
pub mod order;
pub mod paper;
pub mod position;
pub mod registry;
pub mod trade;
pub mod vault;

pub use balance::{AssetBalance, Balance};
pub use error::ExecutionError;
pub use order::{ExecutionRunId, Order, OrderId, OrderStatus, StrategyRunId};
pub use position::Position;
pub use registry::{AdapterDeadlines, BrokerFactory, BrokerRegistry};
pub use trade::{Trade, TradeId};
pub use vault::CredentialVault;

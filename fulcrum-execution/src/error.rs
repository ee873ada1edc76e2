//! Errors surfaced by this crate's own plumbing (registry, vault) as
//! distinct from [`fulcrum_markets::BrokerError`], which an adapter call
//! itself returns.

use fulcrum_markets::{BrokerError, BrokerKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("no adapter registered for broker kind {0}")]
    UnknownBroker(BrokerKind),

    #[error("broker link has no active session")]
    NoSession,

    #[error("adapter call timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("vault error: {0}")]
    Vault(String),
}

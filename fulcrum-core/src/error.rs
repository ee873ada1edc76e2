//! # Core Error Types
//!
//! Aggregates every error kind spec.md §7 names (Validation,
//! Authentication/Authorization, RMS, BrokerSession, BrokerRejected,
//! AdapterTransport, Internal) behind one [`FulcrumError`], and maps each
//! to the wire error code spec.md §6 defines for the HTTP error envelope.

use fulcrum_execution::ExecutionError;
use fulcrum_markets::BrokerError;
use fulcrum_risk::RmsRejection;
use serde::Serialize;
use thiserror::Error;

use crate::types::TradeIntentError;

#[derive(Debug, Error, Serialize)]
pub enum FulcrumError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("rms: {0}")]
    Rms(#[from] RmsRejectionWire),

    #[error("no eligible accounts")]
    NoEligibleAccounts,

    #[error("broker session expired")]
    BrokerSessionExpired,

    #[error("broker rejected: {0}")]
    BrokerRejected(String),

    #[error("adapter timed out")]
    AdapterTimeout,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal: {0}")]
    Internal(String),
}

/// A serialisable snapshot of an [`RmsRejection`], since the latter's
/// `Decimal`-bearing variants don't round-trip through `thiserror`'s
/// `#[from]` without an intermediate carrying just what the wire error
/// needs.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RmsRejectionWire {
    pub code: &'static str,
    pub message: String,
}

impl From<RmsRejection> for RmsRejectionWire {
    fn from(rejection: RmsRejection) -> Self {
        Self {
            code: rejection.code(),
            message: rejection.to_string(),
        }
    }
}

impl From<TradeIntentError> for FulcrumError {
    fn from(value: TradeIntentError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<BrokerError> for FulcrumError {
    fn from(value: BrokerError) -> Self {
        match value {
            BrokerError::SessionExpired => Self::BrokerSessionExpired,
            BrokerError::Rejected(message) => Self::BrokerRejected(message),
            BrokerError::Timeout(_) => Self::AdapterTimeout,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ExecutionError> for FulcrumError {
    fn from(value: ExecutionError) -> Self {
        match value {
            ExecutionError::Timeout(_) => Self::AdapterTimeout,
            ExecutionError::Broker(broker_error) => broker_error.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl FulcrumError {
    /// The wire error code from spec.md §6's envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ALLOCATION_INVALID",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Rms(wire) => wire.code,
            Self::NoEligibleAccounts => "NO_ELIGIBLE_ACCOUNTS",
            Self::BrokerSessionExpired => "BROKER_SESSION_EXPIRED",
            Self::BrokerRejected(_) => "BROKER_REJECTED",
            Self::AdapterTimeout => "ADAPTER_TIMEOUT",
            Self::Conflict(_) => "CONFLICT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

/// Indicates that the receiver side of a communication channel was
/// dropped — e.g. a run's dispatch task outlived its event-forwarding
/// receiver.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("RxDropped")]
pub struct RxDropped;

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for RxDropped {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Self
    }
}

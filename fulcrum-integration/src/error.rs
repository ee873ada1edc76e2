//! Errors produced by the low-level plumbing in this crate.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SocketError {
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

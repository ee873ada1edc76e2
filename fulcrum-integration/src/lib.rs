#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity)]

//! # Integration — low-level plumbing shared across the Fulcrum workspace
//!
//! Small set of abstractions every other Fulcrum crate builds on: a
//! channel-agnostic [`channel::Tx`] trait (so the orchestrator doesn't
//! care whether a consumer is bounded, unbounded, or a test probe), a
//! [`snapshot::Snapshot`] wrapper for "latest known state of X" values,
//! and the [`Terminal`]/[`Validator`] traits used by the Execution Event
//! Store and the allocation/RMS validation boundaries respectively.

use crate::error::SocketError;

/// All [`Error`](std::error::Error)s generated in Integration.
pub mod error;

/// Defines the [`channel::Tx`] abstraction over different channel kinds.
pub mod channel;

/// Defines [`snapshot::Snapshot`], a timestamped "latest known value"
/// wrapper used for account/position snapshots.
pub mod snapshot;

/// [`Validator`]s are capable of determining if their internal state is
/// satisfactory to fulfill some use case defined by the implementor.
pub trait Validator {
    fn validate(self) -> Result<Self, SocketError>
    where
        Self: Sized;
}

/// Communicates if something is terminal (eg/ requires run/stream
/// shutdown).
pub trait Terminal {
    fn is_terminal(&self) -> bool;
}

/// Indicates an `Iterator` or `Stream` has ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FeedEnded;

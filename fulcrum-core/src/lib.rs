#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Core — Execution Orchestrator and process-wide plumbing
//!
//! The Execution Orchestrator drives one `ExecutionRun` through
//! `Created → Planning → Gating → Dispatching → Finalising →
//! {Succeeded|Partial|Failed|RolledBack}`, wiring together the allocation
//! planner (`fulcrum-allocation`), the RMS gate (`fulcrum-risk`), and the
//! broker adapter registry (`fulcrum-execution`). This crate also owns the
//! entity types the orchestrator reads and writes, the append-only
//! execution event store, process configuration, and error aggregation.

use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Process configuration loaded from defaults, `fulcrum.toml`, and
/// `FULCRUM_*` environment variables.
pub mod config;

/// Resolves which `BrokerLink` backs a given `Account`.
pub mod directory;

/// Crate-wide error aggregation and wire error codes.
pub mod error;

/// Append-only per-run execution event log.
pub mod event_store;

/// Default tracing initialisers, human or JSON output.
pub mod logging;

/// The Execution Orchestrator state machine.
pub mod orchestrator;

/// Traits and types related to component shutdowns.
pub mod shutdown;

/// Orchestrator entity types: `TradeIntent`, `ExecutionGroup`,
/// `ExecutionRun`, `ExecutionEvent`, and their aggregates.
pub mod types;

pub use config::FulcrumConfig;
pub use directory::{AccountDirectory, InMemoryAccountDirectory};
pub use error::FulcrumError;
pub use event_store::{ExecutionEventStore, InMemoryEventStore};
pub use orchestrator::{ExecutionOrchestrator, OrchestratorSettings};
pub use types::*;

use chrono::{DateTime, Utc};

/// A timed value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize, Constructor)]
pub struct Timed<T> {
    pub value: T,
    pub time: DateTime<Utc>,
}

/// Monotonically increasing sequence, scoped per `ExecutionRun`, assigned
/// by the `ExecutionEventStore` on append.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Constructor)]
pub struct Sequence(pub u64);

impl Sequence {
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn fetch_add(&mut self) -> Sequence {
        let sequence = *self;
        self.0 += 1;
        sequence
    }
}

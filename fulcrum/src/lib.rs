//! # Fulcrum — unified façade over the execution and risk core
//!
//! Re-exports the workspace's crates under one dependency, for callers
//! who don't need to pin each crate's version independently.
//!
//! # Example
//! ```rust
//! use fulcrum::core::FulcrumError;
//! use fulcrum::markets::Id;
//! let _id: Id<()> = Id::new();
//! // ExecutionOrchestrator construction requires wiring its collaborators —
//! // see fulcrum::core::orchestrator.
//! ```

// Re-export of internal crates with organised namespaces
pub use fulcrum_analytics as analytics;
pub use fulcrum_core as core;
pub use fulcrum_execution as execution;
pub use fulcrum_integration as integration;
pub use fulcrum_markets as markets;
pub use fulcrum_risk as risk;
pub use fulcrum_scheduler as scheduler;
pub use fulcrum_trader as trader;

pub use fulcrum_allocation as allocation;

// Flat (shallow) re-export of very frequently used symbols
pub use fulcrum_core::{ExecutionOrchestrator, FulcrumError, Sequence};
pub use fulcrum_markets::Id;

/// Optional prelude for single import.
pub mod prelude {
    pub use crate::core::{ExecutionOrchestrator, FulcrumError, Sequence};
    pub use crate::execution::{Order, Trade};
    pub use crate::markets::{Broker, FullBroker, Id};
    pub use crate::trader::{AlgoStrategy, OnTradingDisabled, Strategy, StrategyRunner};
}

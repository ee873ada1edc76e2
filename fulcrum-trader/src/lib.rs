#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Trader — Strategy model and Strategy Runner
//!
//! Binds a [`model::Strategy`] to `backtest`/`paper`/`live` execution via
//! `fulcrum-core`'s `ExecutionOrchestrator` (spec.md §4.7). [`algo`] is the
//! decision-logic trait every strategy implements, including the built-in
//! reference strategies under [`builtin`]; [`on_trading_disabled`] and
//! [`on_disconnect`] are the hooks a deployment wires up for error-budget
//! and session-drop handling.

pub mod algo;
pub mod builtin;
pub mod close_positions;
pub mod model;
pub mod on_disconnect;
pub mod on_trading_disabled;
pub mod runner;

pub use algo::AlgoStrategy;
pub use close_positions::ClosePositionsStrategy;
pub use model::{ErrorBudget, ResultMetrics, Strategy, StrategyId, StrategyRun, StrategyRunMode, StrategyRunStatus, StrategyStatus, StrategyType};
pub use on_disconnect::OnDisconnectStrategy;
pub use on_trading_disabled::OnTradingDisabled;
pub use runner::{NoopTradingDisabledHook, RunnerError, StrategyRunner};

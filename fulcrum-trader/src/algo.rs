//! Core strategy trait: given a market snapshot, produce the next
//! `TradeIntent` (or none). Built-in strategies (`crate::builtin`) and
//! connector-backed strategies implement this one interface, which is what
//! lets the [`crate::runner::StrategyRunner`] share one orchestration path
//! across backtest/paper/live (spec.md §4.7).

use fulcrum_core::TradeIntent;

/// A price sample fed to a strategy on each tick. Deliberately minimal —
/// richer market data (order book depth, greeks) belongs to a
/// strategy-specific state type, not this shared trait.
#[derive(Debug, Clone, Copy)]
pub struct MarketSnapshot {
    pub price: rust_decimal::Decimal,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// A strategy's decision logic, generic over its own internal state.
pub trait AlgoStrategy: Send + Sync {
    type State: Default + Send;

    /// Consumes one snapshot, mutates `state` as needed, and optionally
    /// emits a `TradeIntent` to hand to the Orchestrator.
    fn on_snapshot(&self, state: &mut Self::State, snapshot: &MarketSnapshot) -> Option<TradeIntent>;
}

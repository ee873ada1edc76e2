//! Orchestrator entity types (spec.md §3): `TradeIntent`, `ExecutionGroup`,
//! `ExecutionRun`, `ExecutionEvent`, and the aggregates derived from them.

use chrono::{DateTime, Utc};
use fulcrum_allocation::GroupAccountMapping;
use fulcrum_markets::{AccountId, Id, OrderType, Side, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

pub struct ExecutionGroupTag;
pub type ExecutionGroupId = Id<ExecutionGroupTag>;

pub use fulcrum_execution::{ExecutionRunId, OrderId, StrategyRunId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMode {
    Parallel,
    Sync,
    Staggered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionGroup {
    pub id: ExecutionGroupId,
    pub user: UserId,
    pub name: SmolStr,
    pub mode: DispatchMode,
    pub description: Option<String>,
    pub mappings: Vec<GroupAccountMapping>,
}

#[derive(Debug, Error)]
pub enum TradeIntentError {
    #[error("total_lots must be > 0")]
    ZeroLots,
    #[error("lot_size must be > 0")]
    ZeroLotSize,
}

/// A request to trade a symbol across a group's accounts (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeIntent {
    pub symbol: SmolStr,
    pub exchange: Option<SmolStr>,
    pub token: Option<SmolStr>,
    pub side: Side,
    pub total_lots: u64,
    pub lot_size: u64,
    pub order_type: OrderType,
    pub price: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
}

impl TradeIntent {
    pub fn validate(&self) -> Result<(), TradeIntentError> {
        if self.total_lots == 0 {
            return Err(TradeIntentError::ZeroLots);
        }
        if self.lot_size == 0 {
            return Err(TradeIntentError::ZeroLotSize);
        }
        Ok(())
    }

    pub fn notional_per_lot(&self, ref_price: Decimal) -> Decimal {
        Decimal::from(self.lot_size) * ref_price
    }
}

/// Per-leg outcome, append-only into the `ExecutionEventStore` (spec.md §3,
/// §4.6). `CancelledBeforeSend` is distinct from `Cancelled` — it marks a
/// `sync`-mode leg skipped after an earlier sibling failed (S5), never
/// dispatched at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegStatus {
    Requested,
    Accepted,
    Rejected,
    Filled,
    Cancelled,
    CancelledBeforeSend,
    Error,
    /// Backtest-mode synthetic leg; never touches a broker adapter.
    Simulated,
}

impl LegStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Requested)
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Accepted | Self::Filled | Self::Simulated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    pub run: ExecutionRunId,
    pub sequence: crate::Sequence,
    pub account: AccountId,
    pub order: Option<OrderId>,
    pub status: LegStatus,
    pub requested_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub metadata: serde_json::Value,
}

impl ExecutionEvent {
    pub fn latency_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|completed| (completed - self.requested_at).num_milliseconds())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecutionRunStatus {
    #[default]
    Pending,
    Partial,
    Succeeded,
    Failed,
    RolledBack,
}

impl ExecutionRunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LatencyAggregate {
    pub count: usize,
    pub avg_ms: i64,
    pub p50_ms: i64,
    pub p95_ms: i64,
}

impl LatencyAggregate {
    /// Computes count/avg/p50/p95 over the given latencies. Exact —
    /// sorts the full sample, matching spec.md §4.9's "sorting leg
    /// latencies over the requested window" for run-scoped aggregates
    /// (small, bounded by leg count).
    pub fn compute(mut latencies_ms: Vec<i64>) -> Option<Self> {
        if latencies_ms.is_empty() {
            return None;
        }
        latencies_ms.sort_unstable();
        let count = latencies_ms.len();
        let sum: i64 = latencies_ms.iter().sum();
        let avg_ms = sum / count as i64;
        let percentile = |p: f64| -> i64 {
            let rank = ((count - 1) as f64 * p).round() as usize;
            latencies_ms[rank.min(count - 1)]
        };
        Some(Self {
            count,
            avg_ms,
            p50_ms: percentile(0.50),
            p95_ms: percentile(0.95),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRun {
    pub id: ExecutionRunId,
    pub user: UserId,
    pub group: Option<ExecutionGroupId>,
    pub strategy_run: Option<StrategyRunId>,
    pub requested_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ExecutionRunStatus,
    pub payload: TradeIntent,
    pub latency: Option<LatencyAggregate>,
    /// Set only for a run that terminates `Failed` before any leg
    /// dispatches (eg/ `NO_ELIGIBLE_ACCOUNTS`) — observability detail, not
    /// part of the spec's entity list proper.
    pub failure_code: Option<&'static str>,
}

impl ExecutionRun {
    pub fn new(user: UserId, group: Option<ExecutionGroupId>, payload: TradeIntent) -> Self {
        Self {
            id: Id::new(),
            user,
            group,
            strategy_run: None,
            requested_at: Utc::now(),
            completed_at: None,
            status: ExecutionRunStatus::Pending,
            payload,
            latency: None,
            failure_code: None,
        }
    }

    /// Finalises the run once it reaches a terminal status; a terminal
    /// `ExecutionRun` is immutable thereafter (spec.md §3).
    pub fn finalise(&mut self, status: ExecutionRunStatus, latency: Option<LatencyAggregate>) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.latency = latency;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail_with_code(&mut self, code: &'static str) {
        self.failure_code = Some(code);
        self.finalise(ExecutionRunStatus::Failed, None);
    }
}

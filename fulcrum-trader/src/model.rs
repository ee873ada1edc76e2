//! Strategy and StrategyRun entity types (spec.md §3, §4.7).

use chrono::{DateTime, Utc};
use fulcrum_execution::{ExecutionRunId, StrategyRunId};
use fulcrum_markets::{Id, UserId};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

pub struct StrategyTag;
pub type StrategyId = Id<StrategyTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyType {
    BuiltIn,
    Custom,
    Connector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyStatus {
    Active,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub user: UserId,
    pub name: SmolStr,
    pub kind: StrategyType,
    pub params: serde_json::Value,
    pub status: StrategyStatus,
}

impl Strategy {
    pub fn new(user: UserId, name: impl Into<SmolStr>, kind: StrategyType, params: serde_json::Value) -> Self {
        Self {
            id: Id::new(),
            user,
            name: name.into(),
            kind,
            params,
            status: StrategyStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, StrategyStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyRunMode {
    Backtest,
    Paper,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyRunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Stopped,
}

impl StrategyRunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Stopped)
    }
}

/// `result_metrics` shape per spec.md §4.7: `{pnl, orders, total_lots,
/// avg_latency_ms, execution_run_ids}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultMetrics {
    pub pnl: rust_decimal::Decimal,
    pub orders: u64,
    pub total_lots: u64,
    pub avg_latency_ms: Option<i64>,
    pub execution_run_ids: Vec<ExecutionRunId>,
}

impl ResultMetrics {
    /// Folds one finished `ExecutionRun` into the running aggregate, per
    /// spec.md §9's invariant that `result_metrics.execution_run_ids`
    /// equals the set of ExecutionRuns created during the StrategyRun.
    pub fn record(&mut self, run: &fulcrum_core::ExecutionRun, realized_pnl: rust_decimal::Decimal) {
        self.pnl += realized_pnl;
        self.orders += 1;
        self.total_lots += run.payload.total_lots;
        if let Some(latency) = run.latency {
            let samples = self.execution_run_ids.len() as i64;
            self.avg_latency_ms = Some(match self.avg_latency_ms {
                Some(prev) => (prev * samples + latency.avg_ms) / (samples + 1),
                None => latency.avg_ms,
            });
        }
        self.execution_run_ids.push(run.id);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRun {
    pub id: StrategyRunId,
    pub strategy: StrategyId,
    pub mode: StrategyRunMode,
    pub status: StrategyRunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result_metrics: ResultMetrics,
}

impl StrategyRun {
    pub fn new(strategy: StrategyId, mode: StrategyRunMode) -> Self {
        Self::with_id(Id::new(), strategy, mode)
    }

    /// Builds a `StrategyRun` under a caller-assigned id — used by the
    /// webhook ingress, which must hand out the run's id *before* the run
    /// exists so a duplicate delivery's idempotency check can name it
    /// (spec.md §4.8/S6: "the second response returns CONFLICT with the
    /// first run's id").
    pub fn with_id(id: StrategyRunId, strategy: StrategyId, mode: StrategyRunMode) -> Self {
        Self {
            id,
            strategy,
            mode,
            status: StrategyRunStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            result_metrics: ResultMetrics::default(),
        }
    }

    pub fn finish(&mut self, status: StrategyRunStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.finished_at = Some(Utc::now());
    }
}

/// A sliding error-budget counter: if `failures` exceeds `max_failures`
/// within `window`, the Strategy transitions to `stopped` (spec.md
/// §4.7's "errors exceeding a configured count within a window").
#[derive(Debug, Clone, Copy)]
pub struct ErrorBudget {
    pub max_failures: u32,
    pub window: chrono::Duration,
}

impl Default for ErrorBudget {
    fn default() -> Self {
        Self {
            max_failures: 3,
            window: chrono::Duration::minutes(5),
        }
    }
}

#[derive(Debug, Default)]
pub struct ErrorBudgetTracker {
    failures: Vec<DateTime<Utc>>,
}

impl ErrorBudgetTracker {
    /// Records a failure at `now` and reports whether the budget is now
    /// exceeded, after evicting failures older than `budget.window`.
    pub fn record_failure(&mut self, now: DateTime<Utc>, budget: ErrorBudget) -> bool {
        self.failures.retain(|at| now - *at <= budget.window);
        self.failures.push(now);
        self.failures.len() as u32 > budget.max_failures
    }
}

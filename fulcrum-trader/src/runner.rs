//! The Strategy Runner (spec.md §4.7): binds a [`Strategy`] to zero or
//! more `ExecutionRun`s across `backtest`/`paper`/`live`. Paper and live
//! dispatch through the real [`fulcrum_core::ExecutionOrchestrator`];
//! backtest shares every other part of this path — planning, event
//! logging, `result_metrics` aggregation — but substitutes a deterministic
//! synthetic fill for the broker dispatch step, since `LegStatus::Simulated`
//! legs never touch a broker adapter.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use fulcrum_allocation::plan;
use fulcrum_core::{
    ExecutionEvent, ExecutionEventStore, ExecutionGroup, ExecutionOrchestrator, ExecutionRun, ExecutionRunStatus,
    LatencyAggregate, LegStatus, TradeIntent,
};
use fulcrum_markets::UserId;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::{
    model::{ErrorBudget, ErrorBudgetTracker, Strategy, StrategyRun, StrategyRunMode, StrategyRunStatus, StrategyStatus},
    on_trading_disabled::OnTradingDisabled,
};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("strategy is stopped")]
    StrategyStopped,
    #[error(transparent)]
    Orchestrator(#[from] fulcrum_core::FulcrumError),
}

/// Drives one `StrategyRun` to completion, firing `on_trading_disabled`
/// when the strategy's error budget trips.
pub struct StrategyRunner<H = NoopTradingDisabledHook> {
    orchestrator: Arc<ExecutionOrchestrator>,
    events: Arc<dyn ExecutionEventStore>,
    error_budget: ErrorBudget,
    budgets: DashMap<crate::model::StrategyId, Mutex<ErrorBudgetTracker>>,
    hook: H,
}

impl<H> std::fmt::Debug for StrategyRunner<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRunner").finish_non_exhaustive()
    }
}

impl<H: OnTradingDisabled> StrategyRunner<H> {
    pub fn new(orchestrator: Arc<ExecutionOrchestrator>, events: Arc<dyn ExecutionEventStore>, error_budget: ErrorBudget, hook: H) -> Self {
        Self {
            orchestrator,
            events,
            error_budget,
            budgets: DashMap::new(),
            hook,
        }
    }

    /// Runs one `TradeIntent` to completion under `strategy`, producing a
    /// terminal `StrategyRun` that links exactly the `ExecutionRun`s it
    /// created (spec.md §9).
    #[instrument(skip(self, strategy, group, intent, cancellation), fields(strategy = ?strategy.id, mode = ?mode))]
    pub async fn run_once(
        &self,
        strategy: &mut Strategy,
        mode: StrategyRunMode,
        group: &ExecutionGroup,
        intent: TradeIntent,
        cancellation: CancellationToken,
    ) -> Result<StrategyRun, RunnerError> {
        self.run_as(StrategyRun::new(strategy.id, mode), strategy, mode, group, intent, cancellation).await
    }

    /// As [`Self::run_once`], but under a caller-assigned run id — the
    /// webhook ingress needs to hand out a `StrategyRunId` before
    /// triggering so a duplicate delivery's rejection can name the
    /// original run (spec.md §4.8/S6).
    pub async fn run_once_with_id(
        &self,
        run_id: fulcrum_execution::StrategyRunId,
        strategy: &mut Strategy,
        mode: StrategyRunMode,
        group: &ExecutionGroup,
        intent: TradeIntent,
        cancellation: CancellationToken,
    ) -> Result<StrategyRun, RunnerError> {
        self.run_as(StrategyRun::with_id(run_id, strategy.id, mode), strategy, mode, group, intent, cancellation).await
    }

    async fn run_as(
        &self,
        mut run: StrategyRun,
        strategy: &mut Strategy,
        mode: StrategyRunMode,
        group: &ExecutionGroup,
        intent: TradeIntent,
        cancellation: CancellationToken,
    ) -> Result<StrategyRun, RunnerError> {
        if !strategy.is_active() {
            return Err(RunnerError::StrategyStopped);
        }

        run.status = StrategyRunStatus::Running;

        let execution = match mode {
            StrategyRunMode::Backtest => self.simulate(strategy.user, group, intent).await,
            StrategyRunMode::Paper | StrategyRunMode::Live => {
                self.orchestrator.run(strategy.user, group, intent, cancellation).await
            }
        };

        match execution {
            Ok(execution_run) => {
                let realized_pnl = rust_decimal::Decimal::ZERO; // no PnL projection in this crate; analytics owns that.
                run.result_metrics.record(&execution_run, realized_pnl);
                let failed = matches!(execution_run.status, ExecutionRunStatus::Failed);
                if failed && self.trip_budget(strategy) {
                    self.hook.on_trading_disabled(strategy.id);
                }
                run.finish(if failed { StrategyRunStatus::Failed } else { StrategyRunStatus::Succeeded });
            }
            Err(error) => {
                warn!(%error, "strategy run's execution failed before producing a run");
                if self.trip_budget(strategy) {
                    self.hook.on_trading_disabled(strategy.id);
                }
                run.finish(StrategyRunStatus::Failed);
                return Err(error.into());
            }
        }

        Ok(run)
    }

    fn trip_budget(&self, strategy: &mut Strategy) -> bool {
        let tracker_lock = self.budgets.entry(strategy.id).or_default();
        let mut tracker = tracker_lock.lock();
        let tripped = tracker.record_failure(Utc::now(), self.error_budget);
        if tripped {
            strategy.status = StrategyStatus::Stopped;
        }
        tripped
    }

    /// Deterministic synthetic fill: no broker call, no RMS gate — the
    /// allocation split is preserved so `result_metrics.total_lots`
    /// matches what paper/live would have produced for the same intent.
    async fn simulate(&self, user: UserId, group: &ExecutionGroup, intent: TradeIntent) -> Result<ExecutionRun, fulcrum_core::FulcrumError> {
        intent.validate()?;
        let mut run = ExecutionRun::new(user, Some(group.id), intent.clone());
        let allocation = match plan(&group.mappings, intent.total_lots) {
            Ok(allocation) => allocation,
            Err(_) => {
                run.fail_with_code("NO_ELIGIBLE_ACCOUNTS");
                return Ok(run);
            }
        };

        let mut latencies: Vec<i64> = Vec::new();
        for leg in allocation.dispatchable() {
            let requested_at = Utc::now();
            let completed_at = requested_at;
            latencies.push(0);
            self.events.append(ExecutionEvent {
                run: run.id,
                sequence: fulcrum_core::Sequence(0),
                account: leg.account,
                order: None,
                status: LegStatus::Simulated,
                requested_at,
                completed_at: Some(completed_at),
                message: None,
                metadata: serde_json::json!({ "lots": leg.lots, "mode": "backtest" }),
            });
        }
        run.finalise(ExecutionRunStatus::Succeeded, LatencyAggregate::compute(latencies));
        Ok(run)
    }
}

/// Default no-op hook; a real deployment binds a hook that alerts the
/// user and unwinds open positions (`close_positions`).
#[derive(Debug, Default)]
pub struct NoopTradingDisabledHook;

impl OnTradingDisabled for NoopTradingDisabledHook {
    type OnTradingDisabled = ();

    fn on_trading_disabled(&self, strategy: crate::model::StrategyId) {
        warn!(?strategy, "strategy stopped: error budget exceeded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Strategy, StrategyType};
    use fulcrum_allocation::{AllocationMode, GroupAccountMapping};
    use fulcrum_core::{ExecutionOrchestrator, InMemoryAccountDirectory, InMemoryEventStore, OrchestratorSettings};
    use fulcrum_execution::registry::{AdapterDeadlines, BrokerRegistry};
    use fulcrum_markets::{Id, OrderType, Side};
    use fulcrum_risk::LegRiskManager;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn intent(total_lots: u64) -> TradeIntent {
        TradeIntent {
            symbol: "NIFTY".into(),
            exchange: None,
            token: None,
            side: Side::Buy,
            total_lots,
            lot_size: 50,
            order_type: OrderType::Market,
            price: Some(rust_decimal::Decimal::ONE_HUNDRED),
            take_profit: None,
            stop_loss: None,
        }
    }

    fn group(total_lots: u64) -> ExecutionGroup {
        let mapping = GroupAccountMapping::new(Id::new(), AllocationMode::Fixed, None, Some(total_lots)).unwrap();
        ExecutionGroup {
            id: Id::new(),
            user: Id::new(),
            name: "default".into(),
            mode: fulcrum_core::DispatchMode::Parallel,
            description: None,
            mappings: vec![mapping],
        }
    }

    fn runner() -> StrategyRunner {
        let orchestrator = Arc::new(ExecutionOrchestrator::new(
            Arc::new(BrokerRegistry::new(AdapterDeadlines::default())),
            Arc::new(LegRiskManager::new()),
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryAccountDirectory::new()),
            OrchestratorSettings::default(),
        ));
        StrategyRunner::new(orchestrator, Arc::new(InMemoryEventStore::new()), ErrorBudget::default(), NoopTradingDisabledHook)
    }

    #[tokio::test]
    async fn backtest_mode_produces_simulated_legs_and_succeeded_run() {
        let runner = runner();
        let mut strategy = Strategy::new(Id::new(), "buy-and-hold", StrategyType::BuiltIn, serde_json::json!({}));
        let group = group(3);

        let run = runner
            .run_once(&mut strategy, StrategyRunMode::Backtest, &group, intent(3), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(run.status, StrategyRunStatus::Succeeded);
        assert_eq!(run.result_metrics.execution_run_ids.len(), 1);
        assert_eq!(run.result_metrics.total_lots, 3);
    }

    #[tokio::test]
    async fn exhausting_error_budget_stops_the_strategy() {
        struct CountingHook(AtomicUsize);
        impl OnTradingDisabled for CountingHook {
            type OnTradingDisabled = ();
            fn on_trading_disabled(&self, _strategy: crate::model::StrategyId) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let orchestrator = Arc::new(ExecutionOrchestrator::new(
            Arc::new(BrokerRegistry::new(AdapterDeadlines::default())),
            Arc::new(LegRiskManager::new()),
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryAccountDirectory::new()),
            OrchestratorSettings::default(),
        ));
        let budget = ErrorBudget { max_failures: 1, window: chrono::Duration::minutes(5) };
        let runner = StrategyRunner::new(orchestrator, Arc::new(InMemoryEventStore::new()), budget, CountingHook(AtomicUsize::new(0)));
        let mut strategy = Strategy::new(Id::new(), "always-fails", StrategyType::BuiltIn, serde_json::json!({}));
        // empty mappings: no eligible accounts, planning fails every time.
        let empty_group = ExecutionGroup {
            id: Id::new(),
            user: strategy.user,
            name: "default".into(),
            mode: fulcrum_core::DispatchMode::Parallel,
            description: None,
            mappings: vec![],
        };

        for _ in 0..3 {
            let _ = runner
                .run_once(&mut strategy, StrategyRunMode::Live, &empty_group, intent(1), CancellationToken::new())
                .await;
        }

        assert_eq!(strategy.status, StrategyStatus::Stopped);
        assert!(runner.hook.0.load(Ordering::SeqCst) >= 1);
    }
}

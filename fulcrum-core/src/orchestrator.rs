//! The Execution Orchestrator (spec.md §4.5) — the state machine driving
//! one `ExecutionRun` through
//! `Created → Planning → Gating → Dispatching → Finalising →
//! {Succeeded|Partial|Failed|RolledBack}`.
//!
//! Structured concurrency: [`ExecutionOrchestrator::run`] owns every leg it
//! dispatches and does not return until each has reached a terminal
//! [`LegStatus`] or the run deadline elapses (spec.md §9).

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use fulcrum_allocation::{plan, AllocationError};
use fulcrum_execution::{BrokerRegistry, Order, OrderStatus};
use fulcrum_integration::channel::Tx;
use fulcrum_markets::{BrokerError, Id, OrderIntent, UserId};
use fulcrum_risk::{LegRiskManager, Reservation, RiskLeg};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Best-effort live fan-out of each appended [`ExecutionEvent`] to a
/// listener (analytics, UI timeline) that must never be able to stall or
/// abort a run — hence the `Infallible` error bound, satisfied by
/// wrapping a real sender in `fulcrum_integration::channel::ChannelTxDroppable`.
pub type EventSink = dyn Tx<ExecutionEvent, Error = std::convert::Infallible> + Send + Sync;

use crate::{
    directory::AccountDirectory,
    event_store::ExecutionEventStore,
    types::{DispatchMode, ExecutionEvent, ExecutionGroup, ExecutionRun, ExecutionRunStatus, LatencyAggregate, LegStatus, TradeIntent},
    Sequence,
};

/// Tuning knobs the orchestrator needs beyond what a single `TradeIntent`
/// or `ExecutionGroup` carries. `rollback_on_partial` resolves spec.md
/// §9's open question: the rollback deadline equals whatever remains of
/// the original run deadline when the partial outcome is discovered.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub run_deadline_parallel: Duration,
    pub run_deadline_staggered: Duration,
    pub stagger_delay: Duration,
    pub rollback_on_partial: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            run_deadline_parallel: Duration::from_secs(30),
            run_deadline_staggered: Duration::from_secs(60),
            stagger_delay: Duration::from_millis(250),
            rollback_on_partial: false,
        }
    }
}

pub struct ExecutionOrchestrator {
    registry: Arc<BrokerRegistry>,
    risk: Arc<LegRiskManager>,
    events: Arc<dyn ExecutionEventStore>,
    directory: Arc<dyn AccountDirectory>,
    settings: OrchestratorSettings,
    event_sink: Option<Arc<EventSink>>,
}

impl std::fmt::Debug for ExecutionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionOrchestrator").finish_non_exhaustive()
    }
}

/// A leg that survived Gating: holds its reservation so Finalising can
/// commit or release it once the leg's terminal status is known.
struct SurvivingLeg {
    account: fulcrum_markets::AccountId,
    lots: u64,
    reservation: Reservation,
}

impl ExecutionOrchestrator {
    pub fn new(
        registry: Arc<BrokerRegistry>,
        risk: Arc<LegRiskManager>,
        events: Arc<dyn ExecutionEventStore>,
        directory: Arc<dyn AccountDirectory>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            risk,
            events,
            directory,
            settings,
            event_sink: None,
        }
    }

    /// Registers a best-effort live listener for every `ExecutionEvent`
    /// this orchestrator appends — analytics or a UI timeline, typically.
    /// The event store remains the durable source of truth; a dropped or
    /// backed-up sink never affects run outcome.
    pub fn with_event_sink(mut self, sink: Arc<EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    fn emit(&self, event: ExecutionEvent) -> Sequence {
        if let Some(sink) = &self.event_sink {
            let _ = sink.send(event.clone());
        }
        self.events.append(event)
    }

    #[instrument(skip(self, group, cancellation), fields(user = ?user, symbol = %intent.symbol))]
    pub async fn run(
        &self,
        user: UserId,
        group: &ExecutionGroup,
        intent: TradeIntent,
        cancellation: CancellationToken,
    ) -> Result<ExecutionRun, crate::error::FulcrumError> {
        intent.validate()?;

        let mut run = ExecutionRun::new(user, Some(group.id), intent.clone());

        // Planning.
        let allocation = match plan(&group.mappings, intent.total_lots) {
            Ok(allocation) => allocation,
            Err(AllocationError::NoEligibleAccounts) => {
                run.fail_with_code("NO_ELIGIBLE_ACCOUNTS");
                return Ok(run);
            }
        };

        let dispatchable: Vec<_> = allocation.dispatchable().cloned().collect();
        if dispatchable.is_empty() {
            run.fail_with_code("NO_ELIGIBLE_ACCOUNTS");
            return Ok(run);
        }

        // Gating.
        let surviving = self.gate(&run, user, &intent, &dispatchable).await;
        if surviving.is_empty() {
            run.finalise(ExecutionRunStatus::Failed, None);
            return Ok(run);
        }

        // Dispatching.
        let deadline = match group.mode {
            DispatchMode::Parallel => self.settings.run_deadline_parallel,
            DispatchMode::Sync => self.settings.run_deadline_parallel,
            DispatchMode::Staggered => self.settings.run_deadline_staggered,
        };

        let outcomes = match group.mode {
            DispatchMode::Parallel => {
                self.dispatch_parallel(&run, &intent, &surviving, &cancellation, deadline)
                    .await
            }
            DispatchMode::Sync => self.dispatch_sync(&run, &intent, &surviving, &cancellation).await,
            DispatchMode::Staggered => {
                self.dispatch_staggered(&run, &intent, &surviving, &cancellation, deadline)
                    .await
            }
        };

        // Finalising.
        for (leg, (status, _)) in surviving.iter().zip(outcomes.iter()) {
            if status.is_success() {
                self.risk.commit(user, leg.reservation);
            } else {
                self.risk.release(user, leg.reservation);
            }
        }

        let success_count = outcomes.iter().filter(|(status, _)| status.is_success()).count();
        let mut status = if success_count == dispatchable.len() {
            ExecutionRunStatus::Succeeded
        } else if success_count == 0 {
            ExecutionRunStatus::Failed
        } else {
            ExecutionRunStatus::Partial
        };

        if status == ExecutionRunStatus::Partial
            && group.mode == DispatchMode::Sync
            && self.settings.rollback_on_partial
        {
            self.rollback(&run, &surviving, &outcomes).await;
            status = ExecutionRunStatus::RolledBack;
        }

        let latencies: Vec<i64> = self
            .events
            .events_for_run(run.id)
            .into_iter()
            .filter_map(|event| event.latency_ms())
            .collect();
        run.finalise(status, LatencyAggregate::compute(latencies));

        Ok(run)
    }

    async fn gate(
        &self,
        run: &ExecutionRun,
        user: UserId,
        intent: &TradeIntent,
        dispatchable: &[fulcrum_allocation::AccountAllocation],
    ) -> Vec<SurvivingLeg> {
        let ref_price = intent.price.unwrap_or(Decimal::ONE);
        let now = Utc::now();
        let mut surviving = Vec::with_capacity(dispatchable.len());

        for entry in dispatchable {
            let available_margin = match self.margin_for(entry.account).await {
                Ok(margin) => margin,
                Err(_) => Decimal::ZERO,
            };

            let leg = RiskLeg {
                account: entry.account,
                lots: entry.lots,
                lot_size: intent.lot_size,
                ref_price,
                available_margin,
            };

            match self.risk.pre_trade(user, now, leg) {
                Ok(approved) => surviving.push(SurvivingLeg {
                    account: entry.account,
                    lots: entry.lots,
                    reservation: approved.into_item(),
                }),
                Err(refused) => {
                    self.emit(ExecutionEvent {
                        run: run.id,
                        sequence: Sequence(0),
                        account: entry.account,
                        order: None,
                        status: LegStatus::Rejected,
                        requested_at: now,
                        completed_at: Some(now),
                        message: Some(refused.reason.to_string()),
                        metadata: serde_json::json!({"code": refused.reason.code()}),
                    });
                }
            }
        }

        surviving
    }

    async fn margin_for(&self, account: fulcrum_markets::AccountId) -> Result<Decimal, ()> {
        let Some(link) = self.directory.broker_link_of(account) else {
            return Err(());
        };
        self.registry
            .margin(&link)
            .await
            .map(|snapshot| snapshot.available)
            .map_err(|_| ())
    }

    fn order_intent(&self, intent: &TradeIntent, lots: u64, account: fulcrum_markets::AccountId) -> OrderIntent {
        OrderIntent {
            symbol: intent.symbol.clone(),
            exchange: intent.exchange.clone(),
            side: intent.side,
            quantity: Decimal::from(lots) * Decimal::from(intent.lot_size),
            order_type: intent.order_type,
            price: intent.price,
            take_profit: intent.take_profit,
            stop_loss: intent.stop_loss,
            client_order_id: SmolStr::from(format!("{:x}-{:x}", account.as_u128(), Id::<()>::new().as_u128())),
        }
    }

    async fn dispatch_leg(
        &self,
        run: &ExecutionRun,
        intent: &TradeIntent,
        leg: &SurvivingLeg,
    ) -> (LegStatus, Option<SmolStr>) {
        let Some(link) = self.directory.broker_link_of(leg.account) else {
            self.record_terminal(run, leg.account, LegStatus::Error, Utc::now(), Some("no broker link on file".into()));
            return (LegStatus::Error, None);
        };

        let order_intent = self.order_intent(intent, leg.lots, leg.account);
        let requested_at = Utc::now();
        self.emit(ExecutionEvent {
            run: run.id,
            sequence: Sequence(0),
            account: leg.account,
            order: None,
            status: LegStatus::Requested,
            requested_at,
            completed_at: None,
            message: None,
            metadata: serde_json::Value::Null,
        });

        match self.registry.place(&link, &order_intent).await {
            Ok(broker_order_id) => {
                let _order = Order::new(
                    Id::new(),
                    run.id,
                    run.strategy_run,
                    leg.account,
                    Some(broker_order_id.clone()),
                    intent.symbol.clone(),
                    intent.side,
                    order_intent.quantity,
                    intent.order_type,
                    intent.price,
                    intent.take_profit,
                    intent.stop_loss,
                    OrderStatus::Accepted,
                    requested_at,
                    Utc::now(),
                );
                self.record_terminal(run, leg.account, LegStatus::Accepted, requested_at, None);
                (LegStatus::Accepted, Some(broker_order_id))
            }
            Err(error) => {
                let (status, message) = match &error {
                    fulcrum_execution::ExecutionError::Broker(BrokerError::Rejected(reason)) => {
                        (LegStatus::Rejected, reason.clone())
                    }
                    fulcrum_execution::ExecutionError::Timeout(_) => {
                        (LegStatus::Error, "adapter call timed out".to_string())
                    }
                    other => (LegStatus::Error, other.to_string()),
                };
                self.record_terminal(run, leg.account, status, requested_at, Some(message));
                (status, None)
            }
        }
    }

    fn record_terminal(
        &self,
        run: &ExecutionRun,
        account: fulcrum_markets::AccountId,
        status: LegStatus,
        requested_at: chrono::DateTime<Utc>,
        message: Option<String>,
    ) {
        self.emit(ExecutionEvent {
            run: run.id,
            sequence: Sequence(0),
            account,
            order: None,
            status,
            requested_at,
            completed_at: Some(Utc::now()),
            message,
            metadata: serde_json::Value::Null,
        });
    }

    async fn dispatch_parallel(
        &self,
        run: &ExecutionRun,
        intent: &TradeIntent,
        legs: &[SurvivingLeg],
        cancellation: &CancellationToken,
        deadline: Duration,
    ) -> Vec<(LegStatus, Option<SmolStr>)> {
        let futures = legs.iter().map(|leg| async move {
            if cancellation.is_cancelled() {
                return (LegStatus::CancelledBeforeSend, None);
            }
            match tokio::time::timeout(deadline, self.dispatch_leg(run, intent, leg)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("run deadline exceeded awaiting leg dispatch");
                    (LegStatus::Error, None)
                }
            }
        });
        futures::future::join_all(futures).await
    }

    async fn dispatch_staggered(
        &self,
        run: &ExecutionRun,
        intent: &TradeIntent,
        legs: &[SurvivingLeg],
        cancellation: &CancellationToken,
        deadline: Duration,
    ) -> Vec<(LegStatus, Option<SmolStr>)> {
        let mut outcomes = Vec::with_capacity(legs.len());
        for leg in legs {
            if cancellation.is_cancelled() {
                outcomes.push((LegStatus::CancelledBeforeSend, None));
                continue;
            }
            let outcome = match tokio::time::timeout(deadline, self.dispatch_leg(run, intent, leg)).await {
                Ok(outcome) => outcome,
                Err(_) => (LegStatus::Error, None),
            };
            outcomes.push(outcome);
            tokio::time::sleep(self.settings.stagger_delay).await;
        }
        outcomes
    }

    async fn dispatch_sync(
        &self,
        run: &ExecutionRun,
        intent: &TradeIntent,
        legs: &[SurvivingLeg],
        cancellation: &CancellationToken,
    ) -> Vec<(LegStatus, Option<SmolStr>)> {
        let mut outcomes = Vec::with_capacity(legs.len());
        let mut aborted = false;

        for leg in legs {
            if aborted || cancellation.is_cancelled() {
                outcomes.push((LegStatus::CancelledBeforeSend, None));
                continue;
            }
            let outcome = self.dispatch_leg(run, intent, leg).await;
            if !outcome.0.is_success() {
                aborted = true;
            }
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Best-effort cancel of already-successful legs after a `sync`-mode
    /// Partial outcome (spec.md §9's resolved rollback deadline: whatever
    /// remains of the original run deadline — here, the metadata
    /// deadline already bounds each cancel call).
    async fn rollback(&self, run: &ExecutionRun, legs: &[SurvivingLeg], outcomes: &[(LegStatus, Option<SmolStr>)]) {
        for (leg, (status, broker_order_id)) in legs.iter().zip(outcomes.iter()) {
            if !status.is_success() {
                continue;
            }
            if let (Some(link), Some(broker_order_id)) = (self.directory.broker_link_of(leg.account), broker_order_id) {
                if let Err(error) = self.registry.cancel(&link, broker_order_id).await {
                    warn!(%error, "rollback cancel failed for leg, proceeding best-effort");
                }
            }
            self.record_terminal(run, leg.account, LegStatus::Cancelled, Utc::now(), Some("rolled back".into()));
        }
        info!(run = ?run.id, "run rolled back after sync-mode partial outcome");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fulcrum_allocation::{AllocationMode, GroupAccountMapping};
    use fulcrum_execution::{paper::{PaperTrading, ReferencePrice}, AdapterDeadlines};
    use fulcrum_markets::{
        AccountProvider, Broker, BrokerCredentials, BrokerHolding, BrokerKind, BrokerPosition,
        BrokerSession, MarginSnapshot, OrderPatch, OrderType,
    };
    use rust_decimal_macros::dec;

    fn credentials() -> BrokerCredentials {
        BrokerCredentials {
            client_code: "c1".into(),
            api_key: "k1".into(),
            api_secret: "s1".into(),
            totp_seed: None,
        }
    }

    fn intent(total_lots: u64) -> TradeIntent {
        TradeIntent {
            symbol: "NIFTY".into(),
            exchange: None,
            token: None,
            side: fulcrum_markets::Side::Buy,
            total_lots,
            lot_size: 50,
            order_type: OrderType::Market,
            price: Some(dec!(100)),
            take_profit: None,
            stop_loss: None,
        }
    }

    fn permissive_config() -> fulcrum_risk::RmsConfig {
        fulcrum_risk::RmsConfig {
            max_daily_loss: dec!(1_000_000),
            max_daily_lots: 5,
            max_lots_per_order: None,
            exposure_limit: Decimal::MAX,
            margin_buffer_pct: Decimal::ZERO,
            profit_lock: None,
            trailing_sl_delta: None,
            drawdown_limit: None,
            auto_square_off_enabled: false,
            auto_square_off_buffer_pct: Decimal::ZERO,
            notify_email: None,
            notify_telegram: None,
            exchange_timezone: chrono_tz::Asia::Kolkata,
        }
    }

    /// Adapter that always rejects placement — models a broker returning a
    /// hard rejection for the S5 sync-abort scenario.
    #[derive(Debug)]
    struct RejectingBroker;

    #[async_trait]
    impl Broker for RejectingBroker {
        fn kind(&self) -> BrokerKind {
            BrokerKind::Custom("rejecting".into())
        }
    }

    #[async_trait]
    impl fulcrum_markets::OrderExecutor for RejectingBroker {
        async fn connect(&self, _credentials: &BrokerCredentials) -> Result<BrokerSession, BrokerError> {
            Ok(BrokerSession {
                token: "reject-session".into(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
            })
        }
        async fn refresh(&self, session: &BrokerSession) -> Result<BrokerSession, BrokerError> {
            Ok(session.clone())
        }
        async fn logout(&self, _session: &BrokerSession) -> Result<(), BrokerError> {
            Ok(())
        }
        async fn place(&self, _session: &BrokerSession, _order: &OrderIntent) -> Result<SmolStr, BrokerError> {
            Err(BrokerError::Rejected("margin shortfall at broker".into()))
        }
        async fn modify(&self, _session: &BrokerSession, _id: &str, _patch: &OrderPatch) -> Result<(), BrokerError> {
            Ok(())
        }
        async fn cancel(&self, _session: &BrokerSession, _id: &str) -> Result<(), BrokerError> {
            Ok(())
        }
    }

    #[async_trait]
    impl AccountProvider for RejectingBroker {
        async fn positions(&self, _session: &BrokerSession) -> Result<Vec<BrokerPosition>, BrokerError> {
            Ok(Vec::new())
        }
        async fn holdings(&self, _session: &BrokerSession) -> Result<Vec<BrokerHolding>, BrokerError> {
            Ok(Vec::new())
        }
        async fn margin(&self, _session: &BrokerSession) -> Result<MarginSnapshot, BrokerError> {
            Ok(MarginSnapshot {
                available: dec!(1_000_000),
                used: Decimal::ZERO,
            })
        }
    }

    fn harness() -> (Arc<BrokerRegistry>, Arc<LegRiskManager>, Arc<InMemoryEventStore>, Arc<crate::directory::InMemoryAccountDirectory>) {
        let registry = Arc::new(BrokerRegistry::new(AdapterDeadlines::default()));
        registry.register(
            BrokerKind::PaperTrading,
            Arc::new(|| {
                Arc::new(PaperTrading::new(
                    ReferencePrice(dec!(100)),
                    MarginSnapshot {
                        available: dec!(1_000_000),
                        used: Decimal::ZERO,
                    },
                )) as Arc<dyn fulcrum_markets::FullBroker>
            }),
        );
        registry.register(
            BrokerKind::Custom("rejecting".into()),
            Arc::new(|| Arc::new(RejectingBroker) as Arc<dyn fulcrum_markets::FullBroker>),
        );

        let risk = Arc::new(LegRiskManager::new());
        let events = Arc::new(InMemoryEventStore::new());
        let directory = Arc::new(crate::directory::InMemoryAccountDirectory::new());
        (registry, risk, events, directory)
    }

    fn orchestrator(
        registry: Arc<BrokerRegistry>,
        risk: Arc<LegRiskManager>,
        events: Arc<InMemoryEventStore>,
        directory: Arc<crate::directory::InMemoryAccountDirectory>,
        settings: OrchestratorSettings,
    ) -> ExecutionOrchestrator {
        ExecutionOrchestrator::new(registry, risk, events, directory, settings)
    }

    #[tokio::test]
    async fn parallel_dispatch_all_legs_accepted_produces_succeeded_run() {
        let (registry, risk, events, directory) = harness();
        let user: UserId = Id::new();
        let account_a: fulcrum_markets::AccountId = Id::new();
        let account_b: fulcrum_markets::AccountId = Id::new();
        let link: fulcrum_markets::BrokerLinkId = Id::new();

        registry.link(link, &BrokerKind::PaperTrading, credentials()).unwrap();
        directory.register(account_a, link);
        directory.register(account_b, link);
        risk.set_config(user, permissive_config());

        let group = ExecutionGroup {
            id: Id::new(),
            user,
            name: "group-a".into(),
            mode: DispatchMode::Parallel,
            description: None,
            mappings: vec![
                GroupAccountMapping::new(account_a, AllocationMode::Weighted, Some(dec!(1)), None).unwrap(),
                GroupAccountMapping::new(account_b, AllocationMode::Weighted, Some(dec!(1)), None).unwrap(),
            ],
        };

        let orchestrator = orchestrator(registry, risk, events, directory, OrchestratorSettings::default());
        let run = orchestrator
            .run(user, &group, intent(2), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(run.status, ExecutionRunStatus::Succeeded);
        assert!(run.latency.is_some());
    }

    #[tokio::test]
    async fn rms_trip_on_second_leg_rejects_that_leg_and_produces_partial_run() {
        let (registry, risk, events, directory) = harness();
        let user: UserId = Id::new();
        let account_a: fulcrum_markets::AccountId = Id::new();
        let account_b: fulcrum_markets::AccountId = Id::new();
        let link: fulcrum_markets::BrokerLinkId = Id::new();

        registry.link(link, &BrokerKind::PaperTrading, credentials()).unwrap();
        directory.register(account_a, link);
        directory.register(account_b, link);

        let mut config = permissive_config();
        config.max_daily_lots = 5;
        risk.set_config(user, config);

        let group = ExecutionGroup {
            id: Id::new(),
            user,
            name: "group-b".into(),
            mode: DispatchMode::Sync,
            description: None,
            mappings: vec![
                GroupAccountMapping::new(account_a, AllocationMode::Fixed, None, Some(5)).unwrap(),
                GroupAccountMapping::new(account_b, AllocationMode::Fixed, None, Some(5)).unwrap(),
            ],
        };

        let orchestrator = orchestrator(registry, risk, events, directory, OrchestratorSettings::default());
        let run = orchestrator
            .run(user, &group, intent(10), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(run.status, ExecutionRunStatus::Partial);
    }

    #[tokio::test]
    async fn sync_mode_aborts_remaining_legs_after_first_broker_rejection() {
        let (registry, risk, events, directory) = harness();
        let user: UserId = Id::new();
        let account_rejecting: fulcrum_markets::AccountId = Id::new();
        let account_never_sent: fulcrum_markets::AccountId = Id::new();
        let rejecting_link: fulcrum_markets::BrokerLinkId = Id::new();
        let paper_link: fulcrum_markets::BrokerLinkId = Id::new();

        registry
            .link(rejecting_link, &BrokerKind::Custom("rejecting".into()), credentials())
            .unwrap();
        registry.link(paper_link, &BrokerKind::PaperTrading, credentials()).unwrap();
        directory.register(account_rejecting, rejecting_link);
        directory.register(account_never_sent, paper_link);
        risk.set_config(user, permissive_config());

        let group = ExecutionGroup {
            id: Id::new(),
            user,
            name: "group-c".into(),
            mode: DispatchMode::Sync,
            description: None,
            mappings: vec![
                GroupAccountMapping::new(account_rejecting, AllocationMode::Fixed, None, Some(1)).unwrap(),
                GroupAccountMapping::new(account_never_sent, AllocationMode::Fixed, None, Some(1)).unwrap(),
            ],
        };

        let orchestrator = orchestrator(registry, risk, events, directory, OrchestratorSettings::default());
        let run = orchestrator
            .run(user, &group, intent(2), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(run.status, ExecutionRunStatus::Failed);

        let events = orchestrator.events.events_for_run(run.id);
        let terminal: Vec<_> = events.iter().filter(|event| event.status.is_terminal()).collect();
        assert!(terminal.iter().any(|event| event.status == LegStatus::Rejected));
        assert!(terminal.iter().any(|event| event.status == LegStatus::CancelledBeforeSend));
    }

    #[tokio::test]
    async fn no_eligible_accounts_fails_fast_with_observable_code() {
        let (registry, risk, events, directory) = harness();
        let user: UserId = Id::new();

        let group = ExecutionGroup {
            id: Id::new(),
            user,
            name: "empty-group".into(),
            mode: DispatchMode::Parallel,
            description: None,
            mappings: vec![],
        };

        let orchestrator = orchestrator(registry, risk, events, directory, OrchestratorSettings::default());
        let run = orchestrator
            .run(user, &group, intent(1), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(run.status, ExecutionRunStatus::Failed);
        assert_eq!(run.failure_code, Some("NO_ELIGIBLE_ACCOUNTS"));
    }
}

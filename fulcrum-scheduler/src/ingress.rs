//! Ties [`webhook::WebhookConnector`] and [`idempotency::IdempotencyStore`]
//! to [`fulcrum_trader::StrategyRunner`], implementing the full
//! authenticate → transform → dedupe → trigger chain (spec.md §4.8).

use fulcrum_core::{ExecutionGroup, FulcrumError};
use fulcrum_markets::Id;
use fulcrum_trader::{Strategy, StrategyRun, StrategyRunMode, StrategyRunner};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    idempotency::IdempotencyStore,
    webhook::{WebhookConnector, WebhookError},
};

#[derive(Debug, thiserror::Error)]
pub enum IngressError {
    #[error(transparent)]
    Webhook(#[from] WebhookError),
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("duplicate delivery, already triggered run {0}")]
    Duplicate(String),
    #[error(transparent)]
    Runner(#[from] fulcrum_trader::RunnerError),
}

impl From<IngressError> for FulcrumError {
    fn from(error: IngressError) -> Self {
        match error {
            IngressError::Webhook(WebhookError::Unauthorized) => FulcrumError::Unauthorized,
            IngressError::Webhook(error) => FulcrumError::Validation(error.to_string()),
            IngressError::Malformed(error) => FulcrumError::Validation(error.to_string()),
            IngressError::Duplicate(first_run_id) => FulcrumError::Conflict(first_run_id),
            IngressError::Runner(fulcrum_trader::RunnerError::StrategyStopped) => {
                FulcrumError::Validation("strategy is stopped".into())
            }
            IngressError::Runner(fulcrum_trader::RunnerError::Orchestrator(error)) => error,
        }
    }
}

/// Wires one [`WebhookConnector`] to the [`StrategyRunner`] that will
/// execute its trigger, deduplicating retried deliveries.
pub struct WebhookIngress<H = fulcrum_trader::NoopTradingDisabledHook> {
    runner: StrategyRunner<H>,
    idempotency: IdempotencyStore,
}

impl<H> std::fmt::Debug for WebhookIngress<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookIngress").finish_non_exhaustive()
    }
}

impl<H: fulcrum_trader::OnTradingDisabled> WebhookIngress<H> {
    pub fn new(runner: StrategyRunner<H>, idempotency: IdempotencyStore) -> Self {
        Self { runner, idempotency }
    }

    /// Authenticates `presented_token` against `connector`, transforms
    /// `payload` into a `TradeIntent`, and triggers `strategy` under
    /// `mode` — unless an identical delivery (same connector, same raw
    /// payload bytes) already produced a run within the idempotency
    /// window, in which case this returns `FulcrumError::Conflict` naming
    /// that run's id (spec.md §4.8/S6) without running anything twice.
    #[instrument(skip(self, strategy, group, presented_token, payload, cancellation), fields(connector = ?connector.id))]
    pub async fn handle(
        &self,
        connector: &WebhookConnector,
        strategy: &mut Strategy,
        group: &ExecutionGroup,
        mode: StrategyRunMode,
        presented_token: &str,
        payload: &[u8],
        cancellation: CancellationToken,
    ) -> Result<StrategyRun, FulcrumError> {
        self.handle_inner(connector, strategy, group, mode, presented_token, payload, cancellation)
            .await
            .map_err(Into::into)
    }

    async fn handle_inner(
        &self,
        connector: &WebhookConnector,
        strategy: &mut Strategy,
        group: &ExecutionGroup,
        mode: StrategyRunMode,
        presented_token: &str,
        payload: &[u8],
        cancellation: CancellationToken,
    ) -> Result<StrategyRun, IngressError> {
        connector.authenticate(presented_token)?;
        let body: serde_json::Value = serde_json::from_slice(payload)?;
        let intent = connector.transform(&body)?;

        let run_id = Id::new();
        if let Some(first_run) = self.idempotency.check_and_record(connector.id, payload, run_id) {
            return Err(IngressError::Duplicate(first_run.to_string()));
        }

        let run = self
            .runner
            .run_once_with_id(run_id, strategy, mode, group, intent, cancellation)
            .await?;
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulcrum_allocation::{AllocationMode, GroupAccountMapping};
    use fulcrum_core::{ExecutionOrchestrator, InMemoryAccountDirectory, InMemoryEventStore, OrchestratorSettings};
    use fulcrum_execution::registry::{AdapterDeadlines, BrokerRegistry};
    use fulcrum_risk::LegRiskManager;
    use fulcrum_trader::{ErrorBudget, StrategyType};
    use std::sync::Arc;
    use std::time::Duration;

    fn connector(token: &str, strategy: fulcrum_trader::StrategyId) -> WebhookConnector {
        WebhookConnector {
            id: Id::new(),
            user: Id::new(),
            token: token.into(),
            strategy,
            transform: vec![
                crate::webhook::FieldMapping { field: "symbol".into(), source: "sym".into() },
                crate::webhook::FieldMapping { field: "side".into(), source: "side".into() },
                crate::webhook::FieldMapping { field: "total_lots".into(), source: "qty".into() },
            ],
            enabled: true,
        }
    }

    fn group() -> ExecutionGroup {
        let mapping = GroupAccountMapping::new(Id::new(), AllocationMode::Fixed, None, Some(2)).unwrap();
        ExecutionGroup {
            id: Id::new(),
            user: Id::new(),
            name: "default".into(),
            mode: fulcrum_core::DispatchMode::Parallel,
            description: None,
            mappings: vec![mapping],
        }
    }

    fn ingress() -> WebhookIngress {
        let orchestrator = Arc::new(ExecutionOrchestrator::new(
            Arc::new(BrokerRegistry::new(AdapterDeadlines::default())),
            Arc::new(LegRiskManager::new()),
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryAccountDirectory::new()),
            OrchestratorSettings::default(),
        ));
        let runner = StrategyRunner::new(
            orchestrator,
            Arc::new(InMemoryEventStore::new()),
            ErrorBudget::default(),
            fulcrum_trader::NoopTradingDisabledHook,
        );
        WebhookIngress::new(runner, IdempotencyStore::new(Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn duplicate_delivery_within_window_returns_conflict_naming_the_first_run() {
        let ingress = ingress();
        let mut strategy = Strategy::new(Id::new(), "webhook-strategy", StrategyType::Connector, serde_json::json!({}));
        let connector = connector("s3cret", strategy.id);
        let group = group();
        let payload = br#"{"sym":"NIFTY","side":"buy","qty":2}"#;

        let first = ingress
            .handle(&connector, &mut strategy, &group, StrategyRunMode::Backtest, "s3cret", payload, CancellationToken::new())
            .await
            .unwrap();

        let second = ingress
            .handle(&connector, &mut strategy, &group, StrategyRunMode::Backtest, "s3cret", payload, CancellationToken::new())
            .await;

        match second {
            Err(FulcrumError::Conflict(first_run_id)) => assert_eq!(first_run_id, first.id.to_string()),
            other => panic!("expected Conflict naming {}, got {other:?}", first.id),
        }
    }

    #[tokio::test]
    async fn wrong_token_never_reaches_the_runner() {
        let ingress = ingress();
        let mut strategy = Strategy::new(Id::new(), "webhook-strategy", StrategyType::Connector, serde_json::json!({}));
        let connector = connector("s3cret", strategy.id);
        let group = group();
        let payload = br#"{"sym":"NIFTY","side":"buy","qty":2}"#;

        let result = ingress
            .handle(&connector, &mut strategy, &group, StrategyRunMode::Backtest, "wrong", payload, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(FulcrumError::Unauthorized)));
    }
}

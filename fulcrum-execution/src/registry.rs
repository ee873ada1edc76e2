//! Broker Adapter Registry (spec.md §4.1).
//!
//! Maps a [`BrokerKind`] to a [`BrokerFactory`], holds one session-refresh
//! lock per `BrokerLink`, and enforces per-adapter call deadlines. This is
//! the only place in the workspace that talks to a [`FullBroker`] directly;
//! the orchestrator (`fulcrum-core`) only ever calls through here.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use fulcrum_markets::{
    AccountProvider, Broker, BrokerCredentials, BrokerError, BrokerKind, BrokerLinkId,
    BrokerSession, FullBroker, OrderExecutor, OrderIntent, OrderPatch,
};
use tokio::sync::Mutex;
use tracing::{instrument, warn};

use crate::error::ExecutionError;

/// Builds a fresh adapter instance for a given [`BrokerKind`]. One factory
/// per kind is registered; a factory may be called many times (eg/ one
/// adapter instance per `BrokerLink`), so it must be cheap and stateless.
pub trait BrokerFactory: Send + Sync {
    fn create(&self) -> Arc<dyn FullBroker>;
}

impl<F> BrokerFactory for F
where
    F: Fn() -> Arc<dyn FullBroker> + Send + Sync,
{
    fn create(&self) -> Arc<dyn FullBroker> {
        (self)()
    }
}

/// Per-adapter-call deadlines (spec.md §4.1): 5s for order placement, 2s
/// for metadata/account queries.
#[derive(Debug, Clone, Copy)]
pub struct AdapterDeadlines {
    pub place: Duration,
    pub metadata: Duration,
}

impl Default for AdapterDeadlines {
    fn default() -> Self {
        Self {
            place: Duration::from_secs(5),
            metadata: Duration::from_secs(2),
        }
    }
}

struct LinkState {
    adapter: Arc<dyn FullBroker>,
    credentials: BrokerCredentials,
    session: Mutex<Option<BrokerSession>>,
}

/// Registry of broker adapters keyed by [`BrokerKind`], plus the live
/// session state for every connected [`BrokerLinkId`].
pub struct BrokerRegistry {
    factories: DashMap<BrokerKind, Arc<dyn BrokerFactory>>,
    links: DashMap<BrokerLinkId, Arc<LinkState>>,
    deadlines: AdapterDeadlines,
}

impl std::fmt::Debug for BrokerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerRegistry")
            .field("known_kinds", &self.factories.len())
            .field("linked_accounts", &self.links.len())
            .finish()
    }
}

impl BrokerRegistry {
    pub fn new(deadlines: AdapterDeadlines) -> Self {
        Self {
            factories: DashMap::new(),
            links: DashMap::new(),
            deadlines,
        }
    }

    pub fn register(&self, kind: BrokerKind, factory: Arc<dyn BrokerFactory>) {
        self.factories.insert(kind, factory);
    }

    /// Registers a `BrokerLink`, instantiating its adapter from the
    /// matching factory. Credentials are held only long enough to pass to
    /// `connect`/retry calls; the vault, not this registry, is the source
    /// of truth for them at rest.
    pub fn link(
        &self,
        link: BrokerLinkId,
        kind: &BrokerKind,
        credentials: BrokerCredentials,
    ) -> Result<(), ExecutionError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ExecutionError::UnknownBroker(kind.clone()))?;
        self.links.insert(
            link,
            Arc::new(LinkState {
                adapter: factory.create(),
                credentials,
                session: Mutex::new(None),
            }),
        );
        Ok(())
    }

    pub fn unlink(&self, link: &BrokerLinkId) {
        self.links.remove(link);
    }

    fn state(&self, link: &BrokerLinkId) -> Result<Arc<LinkState>, ExecutionError> {
        self.links
            .get(link)
            .map(|entry| Arc::clone(&entry))
            .ok_or(ExecutionError::NoSession)
    }

    /// Returns a live session for `link`, connecting if none exists yet.
    /// Holds the per-link session mutex for the duration of the check so
    /// two concurrent callers never both attempt to connect.
    async fn ensure_session(&self, state: &LinkState) -> Result<BrokerSession, ExecutionError> {
        let mut guard = state.session.lock().await;
        if let Some(session) = guard.as_ref() {
            if !session.is_expired(chrono::Utc::now()) {
                return Ok(session.clone());
            }
        }
        let session = with_deadline(
            self.deadlines.metadata,
            state.adapter.connect(&state.credentials),
        )
        .await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Places an order, retrying exactly once on `SESSION_EXPIRED` by
    /// re-authenticating from saved credentials (spec.md §4.1).
    #[instrument(skip(self, order), fields(symbol = %order.symbol))]
    pub async fn place(
        &self,
        link: &BrokerLinkId,
        order: &OrderIntent,
    ) -> Result<smol_str::SmolStr, ExecutionError> {
        let state = self.state(link)?;
        let session = self.ensure_session(&state).await?;

        match with_deadline(self.deadlines.place, state.adapter.place(&session, order)).await {
            Err(ExecutionError::Broker(BrokerError::SessionExpired)) => {
                warn!("session expired mid-place, retrying once after re-auth");
                let mut guard = state.session.lock().await;
                *guard = None;
                drop(guard);
                let fresh = self.ensure_session(&state).await?;
                with_deadline(self.deadlines.place, state.adapter.place(&fresh, order)).await
            }
            other => other,
        }
    }

    pub async fn modify(
        &self,
        link: &BrokerLinkId,
        broker_order_id: &str,
        patch: &OrderPatch,
    ) -> Result<(), ExecutionError> {
        let state = self.state(link)?;
        let session = self.ensure_session(&state).await?;
        with_deadline(
            self.deadlines.metadata,
            state.adapter.modify(&session, broker_order_id, patch),
        )
        .await
    }

    pub async fn cancel(
        &self,
        link: &BrokerLinkId,
        broker_order_id: &str,
    ) -> Result<(), ExecutionError> {
        let state = self.state(link)?;
        let session = self.ensure_session(&state).await?;
        with_deadline(
            self.deadlines.metadata,
            state.adapter.cancel(&session, broker_order_id),
        )
        .await
    }

    pub async fn margin(
        &self,
        link: &BrokerLinkId,
    ) -> Result<fulcrum_markets::MarginSnapshot, ExecutionError> {
        let state = self.state(link)?;
        let session = self.ensure_session(&state).await?;
        with_deadline(self.deadlines.metadata, state.adapter.margin(&session)).await
    }

    pub async fn positions(
        &self,
        link: &BrokerLinkId,
    ) -> Result<Vec<fulcrum_markets::BrokerPosition>, ExecutionError> {
        let state = self.state(link)?;
        let session = self.ensure_session(&state).await?;
        with_deadline(self.deadlines.metadata, state.adapter.positions(&session)).await
    }

    pub fn kind_of(&self, link: &BrokerLinkId) -> Result<BrokerKind, ExecutionError> {
        Ok(self.state(link)?.adapter.kind())
    }
}

async fn with_deadline<T>(
    deadline: Duration,
    fut: impl std::future::Future<Output = Result<T, BrokerError>>,
) -> Result<T, ExecutionError> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(ExecutionError::from),
        Err(_) => Err(ExecutionError::Timeout(deadline)),
    }
}

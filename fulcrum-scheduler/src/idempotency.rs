//! Webhook delivery dedupe (spec.md §4.8): duplicate deliveries within a
//! configurable window, keyed by `(connector, sha256(payload))`, are
//! dropped rather than re-triggering the bound Strategy.

use std::time::Duration;

use dashmap::DashMap;
use fulcrum_execution::StrategyRunId;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::debug;

use crate::webhook::ConnectorId;

pub type PayloadDigest = [u8; 32];

pub fn digest(payload: &[u8]) -> PayloadDigest {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.finalize().into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DedupeKey {
    connector: ConnectorId,
    digest: PayloadDigest,
}

struct Entry {
    strategy_run: StrategyRunId,
    expires_at: Instant,
}

/// Default dedupe window (spec.md §5's 60s default). `DashMap` gives
/// lock-free lookups across connectors; expired entries are swept lazily
/// on insert rather than by a background task, matching
/// `InMemoryEventStore`'s "no extra task to keep alive" texture.
pub struct IdempotencyStore {
    window: Duration,
    entries: DashMap<DedupeKey, Entry>,
}

impl std::fmt::Debug for IdempotencyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdempotencyStore")
            .field("window", &self.window)
            .field("tracked", &self.entries.len())
            .finish()
    }
}

impl IdempotencyStore {
    pub fn new(window: Duration) -> Self {
        Self { window, entries: DashMap::new() }
    }

    /// Returns the earlier delivery's `StrategyRunId`-scoped run identity if
    /// `(connector, payload)` was already seen within the window;
    /// otherwise records this delivery and returns `None`.
    pub fn check_and_record(&self, connector: ConnectorId, payload: &[u8], triggered: StrategyRunId) -> Option<StrategyRunId> {
        self.sweep();
        let key = DedupeKey { connector, digest: digest(payload) };
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                let first_run = existing.get().strategy_run;
                debug!(digest = %hex::encode(key.digest), %connector, %first_run, "duplicate webhook delivery dropped");
                Some(first_run)
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(Entry { strategy_run: triggered, expires_at: Instant::now() + self.window });
                None
            }
        }
    }

    fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }
}

impl Default for IdempotencyStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulcrum_markets::Id;
    use std::thread::sleep;

    #[test]
    fn second_identical_delivery_within_window_returns_the_first_run() {
        let store = IdempotencyStore::new(Duration::from_secs(60));
        let connector = Id::new();
        let first = Id::new();
        let second = Id::new();

        assert!(store.check_and_record(connector, b"payload", first).is_none());
        assert_eq!(store.check_and_record(connector, b"payload", second), Some(first));
    }

    #[test]
    fn delivery_after_the_window_is_not_deduped() {
        let store = IdempotencyStore::new(Duration::from_millis(20));
        let connector = Id::new();
        let first = Id::new();
        let second = Id::new();

        assert!(store.check_and_record(connector, b"payload", first).is_none());
        sleep(Duration::from_millis(40));
        assert!(store.check_and_record(connector, b"payload", second).is_none());
    }

    #[test]
    fn different_payloads_do_not_collide() {
        let store = IdempotencyStore::new(Duration::from_secs(60));
        let connector = Id::new();
        let first = Id::new();
        let second = Id::new();

        assert!(store.check_and_record(connector, b"payload-a", first).is_none());
        assert!(store.check_and_record(connector, b"payload-b", second).is_none());
    }
}

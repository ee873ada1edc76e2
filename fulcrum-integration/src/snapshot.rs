//! [`Snapshot`] — "latest known value of X" wrapper.
//!
//! Used for account/balance/order snapshots (`fulcrum-execution`) where a
//! consumer only ever wants the freshest value and the producer's update
//! cadence is otherwise irrelevant.

use chrono::{DateTime, Utc};
use derive_more::Constructor;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Constructor)]
pub struct Snapshot<T>(pub T);

impl<T> Snapshot<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// A [`Snapshot`] paired with the exchange timestamp it was observed at,
/// used where ordering two snapshots by recency matters (eg/ the
/// Orchestrator deciding whether a late-arriving account update is stale).
#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct TimedSnapshot<T> {
    pub value: T,
    pub time_exchange: DateTime<Utc>,
}

impl<T> TimedSnapshot<T> {
    pub fn is_more_recent_than(&self, other: &Self) -> bool {
        self.time_exchange > other.time_exchange
    }
}

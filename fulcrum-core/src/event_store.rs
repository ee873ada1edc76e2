//! The Execution Event Store (spec.md §4.6): an append-only log keyed by
//! `(run, sequence)`. The in-process [`InMemoryEventStore`] is the default
//! and the one the orchestrator's own tests run against; a durable-store
//! implementation (e.g. backed by `DATABASE_URL`, spec.md §6) plugs in
//! behind the same [`ExecutionEventStore`] trait without the orchestrator
//! changing.

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::types::{ExecutionEvent, ExecutionRunId};
use crate::Sequence;

/// Durable append-only log for one run's leg events. Readers see a
/// monotonic sequence per run (spec.md §4.6); writers never mutate or
/// remove a previously appended event.
pub trait ExecutionEventStore: Send + Sync {
    /// Appends `event`, stamping it with the next `Sequence` for its run,
    /// and returns that sequence.
    fn append(&self, event: ExecutionEvent) -> Sequence;

    fn events_for_run(&self, run: ExecutionRunId) -> Vec<ExecutionEvent>;
}

/// Default in-process store. `DashMap` gives lock-free reads/writes across
/// distinct runs; the per-run `Mutex<Vec<_>>` keeps one run's append order
/// strictly sequential without serialising unrelated runs against each
/// other.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    runs: DashMap<ExecutionRunId, Mutex<RunLog>>,
}

#[derive(Debug, Default)]
struct RunLog {
    next_sequence: u64,
    events: Vec<ExecutionEvent>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionEventStore for InMemoryEventStore {
    fn append(&self, mut event: ExecutionEvent) -> Sequence {
        let log_lock = self
            .runs
            .entry(event.run)
            .or_insert_with(|| Mutex::new(RunLog::default()));
        let mut log = log_lock.lock();
        let sequence = Sequence(log.next_sequence);
        log.next_sequence += 1;
        event.sequence = sequence;
        log.events.push(event);
        sequence
    }

    fn events_for_run(&self, run: ExecutionRunId) -> Vec<ExecutionEvent> {
        self.runs
            .get(&run)
            .map(|log| log.lock().events.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LegStatus;
    use fulcrum_markets::Id;

    fn event(run: ExecutionRunId) -> ExecutionEvent {
        ExecutionEvent {
            run,
            sequence: Sequence(0),
            account: Id::new(),
            order: None,
            status: LegStatus::Requested,
            requested_at: chrono::Utc::now(),
            completed_at: None,
            message: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn sequence_is_monotonic_and_scoped_per_run() {
        let store = InMemoryEventStore::new();
        let run_a: ExecutionRunId = Id::new();
        let run_b: ExecutionRunId = Id::new();

        let seq_a0 = store.append(event(run_a));
        let seq_a1 = store.append(event(run_a));
        let seq_b0 = store.append(event(run_b));

        assert_eq!(seq_a0, Sequence(0));
        assert_eq!(seq_a1, Sequence(1));
        assert_eq!(seq_b0, Sequence(0));
        assert_eq!(store.events_for_run(run_a).len(), 2);
        assert_eq!(store.events_for_run(run_b).len(), 1);
    }
}

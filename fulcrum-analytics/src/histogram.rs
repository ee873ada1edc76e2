//! Per-run leg-status histogram (spec.md §4.9).

use fulcrum_core::{ExecutionEvent, LegStatus};
use serde::{Deserialize, Serialize};

/// Count of legs by terminal (or still-pending) status. A fixed struct
/// rather than a `HashMap<LegStatus, u64>` so JSON export has a stable,
/// documented key order (spec.md §6).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegStatusHistogram {
    pub requested: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub filled: u64,
    pub cancelled: u64,
    pub cancelled_before_send: u64,
    pub error: u64,
    pub simulated: u64,
}

impl LegStatusHistogram {
    pub fn from_events(events: &[ExecutionEvent]) -> Self {
        let mut histogram = Self::default();
        for event in events {
            histogram.record(event.status);
        }
        histogram
    }

    pub fn record(&mut self, status: LegStatus) {
        match status {
            LegStatus::Requested => self.requested += 1,
            LegStatus::Accepted => self.accepted += 1,
            LegStatus::Rejected => self.rejected += 1,
            LegStatus::Filled => self.filled += 1,
            LegStatus::Cancelled => self.cancelled += 1,
            LegStatus::CancelledBeforeSend => self.cancelled_before_send += 1,
            LegStatus::Error => self.error += 1,
            LegStatus::Simulated => self.simulated += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.requested
            + self.accepted
            + self.rejected
            + self.filled
            + self.cancelled
            + self.cancelled_before_send
            + self.error
            + self.simulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fulcrum_markets::Id;

    fn event(status: LegStatus) -> ExecutionEvent {
        ExecutionEvent {
            run: Id::new(),
            sequence: fulcrum_core::Sequence(0),
            account: Id::new(),
            order: None,
            status,
            requested_at: Utc::now(),
            completed_at: None,
            message: None,
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn counts_each_status_independently() {
        let events = vec![event(LegStatus::Accepted), event(LegStatus::Accepted), event(LegStatus::Rejected)];
        let histogram = LegStatusHistogram::from_events(&events);
        assert_eq!(histogram.accepted, 2);
        assert_eq!(histogram.rejected, 1);
        assert_eq!(histogram.total(), 3);
    }
}

//! Cron-driven job firing (spec.md §4.8).
//!
//! Responsibilities:
//! - Evaluate every registered `ScheduledJob` once per tick against the
//!   wall clock and enqueue a `FiredJob` for each one due.
//! - Enforce at-most-once semantics per scheduled instant: a job that
//!   missed firings during downtime catches up once, not once per
//!   missed minute.
//!
//! Non-responsibilities:
//! - Building or dispatching the `StrategyRun` itself — that is
//!   `fulcrum_trader::StrategyRunner`'s job; this module only emits
//!   `FiredJob` onto the channel the caller wires a runner to.
//! - Persisting jobs across restarts — `ScheduledJob` storage is the
//!   caller's concern, mirroring `fulcrum-core`'s event-store split.
//!
//! Safety/liveness properties:
//! - One tick never blocks on strategy execution: firing only sends into
//!   a bounded channel, so a slow consumer backs up the channel, not the
//!   scheduler loop.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fulcrum_trader::StrategyId;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::job::{CronError, ScheduledJob, ScheduledJobId};

/// One job's firing, handed off for a caller-owned `StrategyRunner` to
/// turn into a `StrategyRun`.
#[derive(Debug, Clone)]
pub struct FiredJob {
    pub job_id: ScheduledJobId,
    pub strategy: StrategyId,
    pub context: serde_json::Value,
}

pub struct Scheduler {
    jobs: DashMap<ScheduledJobId, Mutex<ScheduledJob>>,
    tx: mpsc::Sender<FiredJob>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").field("jobs", &self.jobs.len()).finish()
    }
}

impl Scheduler {
    pub fn new(tx: mpsc::Sender<FiredJob>) -> Self {
        Self { jobs: DashMap::new(), tx }
    }

    pub fn add_job(&self, job: ScheduledJob) {
        self.jobs.insert(job.id, Mutex::new(job));
    }

    pub fn remove_job(&self, id: ScheduledJobId) {
        self.jobs.remove(&id);
    }

    pub fn set_enabled(&self, id: ScheduledJobId, enabled: bool) {
        if let Some(entry) = self.jobs.get(&id) {
            entry.lock().enabled = enabled;
        }
    }

    /// Evaluates every job against `now`, firing the due ones. Returns the
    /// number fired. A job whose cron expression no longer parses (should
    /// not happen post-validation, but jobs can be edited) is skipped and
    /// logged rather than aborting the whole tick.
    #[instrument(skip(self))]
    pub async fn on_tick(&self, now: DateTime<Utc>) -> usize {
        let due: Vec<FiredJob> = self
            .jobs
            .iter()
            .filter_map(|entry| {
                let mut job = entry.value().lock();
                match job.should_fire(now) {
                    Ok(true) => {
                        job.mark_fired(now);
                        Some(FiredJob { job_id: *entry.key(), strategy: job.strategy, context: job.context.clone() })
                    }
                    Ok(false) => None,
                    Err(error) => {
                        warn!(%error, job = ?entry.key(), "skipping job with invalid cron expression");
                        None
                    }
                }
            })
            .collect();

        let mut fired = 0;
        for job in due {
            if self.tx.send(job).await.is_err() {
                warn!("fired-job queue closed; job state already advanced, firing is lost this tick");
            } else {
                fired += 1;
            }
        }
        fired
    }

    /// Drives the 1s tick loop (spec.md §5 default) until `cancellation`
    /// fires.
    pub async fn run(self: Arc<Self>, tick: Duration, cancellation: CancellationToken) {
        let mut interval = tokio::time::interval(tick);
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => break,
                _ = interval.tick() => {
                    self.on_tick(Utc::now()).await;
                }
            }
        }
    }
}

pub use crate::job::CronError as SchedulerError;

#[cfg(test)]
mod tests {
    use super::*;
    use fulcrum_markets::Id;

    #[tokio::test]
    async fn fires_a_due_job_exactly_once_per_tick() {
        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = Scheduler::new(tx);
        let job = ScheduledJob::new(Id::new(), "* * * * *", serde_json::json!({"symbol": "NIFTY"})).unwrap();
        scheduler.add_job(job);

        let fired = scheduler.on_tick(Utc::now()).await;
        assert_eq!(fired, 1);
        assert!(rx.try_recv().is_ok());

        let fired_again = scheduler.on_tick(Utc::now()).await;
        assert_eq!(fired_again, 0);
    }

    #[tokio::test]
    async fn disabled_jobs_are_skipped() {
        let (tx, mut rx) = mpsc::channel(8);
        let scheduler = Scheduler::new(tx);
        let job = ScheduledJob::new(Id::new(), "* * * * *", serde_json::json!({})).unwrap();
        let id = job.id;
        scheduler.add_job(job);
        scheduler.set_enabled(id, false);

        assert_eq!(scheduler.on_tick(Utc::now()).await, 0);
        assert!(rx.try_recv().is_err());
    }
}

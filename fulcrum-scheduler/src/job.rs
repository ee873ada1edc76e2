//! `ScheduledJob` (spec.md §3): a cron expression bound to a Strategy,
//! with minute granularity (spec.md §4.8).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use cron::Schedule;
use fulcrum_markets::Id;
use fulcrum_trader::StrategyId;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

pub struct ScheduledJobTag;
pub type ScheduledJobId = Id<ScheduledJobTag>;

#[derive(Debug, Error)]
pub enum CronError {
    #[error("invalid cron expression: {0}")]
    InvalidExpression(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: ScheduledJobId,
    pub strategy: StrategyId,
    pub cron_expr: SmolStr,
    pub enabled: bool,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub context: serde_json::Value,
}

impl ScheduledJob {
    pub fn new(strategy: StrategyId, cron_expr: impl Into<SmolStr>, context: serde_json::Value) -> Result<Self, CronError> {
        let cron_expr = cron_expr.into();
        parse_minute_cron(&cron_expr)?;
        Ok(Self {
            id: Id::new(),
            strategy,
            cron_expr,
            enabled: true,
            last_fired_at: None,
            context,
        })
    }

    /// Whether this job should fire given the current wall clock, per
    /// spec.md §4.8's `now ≥ next_fire`. At-most-once: a job stopped for
    /// longer than one period fires exactly once on resumption, not once
    /// per missed minute (see [`Self::mark_fired`]).
    pub fn should_fire(&self, now: DateTime<Utc>) -> Result<bool, CronError> {
        if !self.enabled {
            return Ok(false);
        }
        let schedule = parse_minute_cron(&self.cron_expr)?;
        let baseline = self.last_fired_at.unwrap_or_else(|| now - chrono::Duration::days(1));
        Ok(schedule.after(&baseline).next().is_some_and(|next_fire| now >= next_fire))
    }

    /// Resyncs the job to `now` rather than to the scheduled instant that
    /// triggered this firing, so missed instants during downtime are
    /// never replayed.
    pub fn mark_fired(&mut self, now: DateTime<Utc>) {
        self.last_fired_at = Some(now);
    }
}

/// Minute-granularity cron: the `cron` crate's grammar requires a leading
/// seconds field, so a user-facing 5-field expression is parsed as
/// `"0 {expr}"`, pinning every fire to second zero.
pub fn parse_minute_cron(expr: &str) -> Result<Schedule, CronError> {
    let with_seconds = format!("0 {expr}");
    Schedule::from_str(&with_seconds).map_err(|error| CronError::InvalidExpression(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_malformed_expression() {
        assert!(ScheduledJob::new(Id::new(), "not a cron", serde_json::json!({})).is_err());
    }

    #[test]
    fn does_not_fire_before_the_first_scheduled_minute() {
        let job = ScheduledJob::new(Id::new(), "* * * * *", serde_json::json!({})).unwrap();
        // Every-minute expression with no prior firing: baseline is "yesterday",
        // so the next scheduled minute is always already in the past relative to now.
        assert!(job.should_fire(Utc::now()).unwrap());
    }

    #[test]
    fn disabled_jobs_never_fire() {
        let mut job = ScheduledJob::new(Id::new(), "* * * * *", serde_json::json!({})).unwrap();
        job.enabled = false;
        assert!(!job.should_fire(Utc::now()).unwrap());
    }

    #[test]
    fn does_not_refire_immediately_after_marking_fired() {
        let mut job = ScheduledJob::new(Id::new(), "* * * * *", serde_json::json!({})).unwrap();
        let now = Utc::now();
        job.mark_fired(now);
        assert!(!job.should_fire(now).unwrap());
    }
}

#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Scheduler — cron job firing and webhook ingress
//!
//! Two independent entry points trigger a `StrategyRun`, both feeding the
//! same `fulcrum_trader::StrategyRunner`:
//!
//! - [`scheduler::Scheduler`] evaluates registered [`job::ScheduledJob`]s
//!   against the wall clock once per tick and emits a `FiredJob`.
//! - [`ingress::WebhookIngress`] authenticates an inbound delivery against
//!   a [`webhook::WebhookConnector`], transforms its payload into a
//!   `TradeIntent`, and de-duplicates retried deliveries via
//!   [`idempotency::IdempotencyStore`] so a connector's at-least-once
//!   delivery semantics never produce two live `StrategyRun`s.

pub mod idempotency;
pub mod ingress;
pub mod job;
pub mod scheduler;
pub mod webhook;

pub use idempotency::IdempotencyStore;
pub use ingress::{IngressError, WebhookIngress};
pub use job::{CronError, ScheduledJob, ScheduledJobId};
pub use scheduler::{FiredJob, Scheduler};
pub use webhook::{ConnectorId, FieldMapping, WebhookConnector, WebhookError};

#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Risk — the RMS pre-trade gate and enforcement sweep (spec.md §4.4)
//!
//! The gate holds per-user `RmsConfig`/`RmsCounters` pairs behind a
//! per-user lock (`gate::LegRiskManager`) and decides, leg by leg,
//! whether to reserve counter capacity for it. The sweep
//! (`sweep::EnforcementSweep`) runs independently of order flow and
//! raises [`sweep::RiskAlert`]s for square-off, profit-lock and
//! drawdown conditions.
//!
//! [`RiskApproved`]/[`RiskRefused`] are the generic accept/reject
//! envelope both stages return.

pub mod check;
pub mod config;
pub mod counters;
pub mod gate;
pub mod sweep;

pub use check::*;
pub use config::RmsConfig;
pub use counters::{Reservation, RmsCounters};
pub use gate::{LegRiskManager, RiskLeg, RmsRejection};
pub use sweep::{EnforcementSweep, RiskAlert, RiskAlertType};

use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};

/// Approved result of a risk check: the item passed and may proceed.
#[derive(
    Debug,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Constructor,
)]
pub struct RiskApproved<T>(pub T);

impl<T> RiskApproved<T> {
    pub fn into_item(self) -> T {
        self.0
    }
}

/// Rejected result of a risk check, carrying the rejected item and the
/// specific reason so callers can surface it in an error envelope
/// (spec.md §6) without losing the leg that triggered it.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Constructor)]
pub struct RiskRefused<T, Reason = String> {
    pub item: T,
    pub reason: Reason,
}

impl<T, Reason> RiskRefused<T, Reason> {
    pub fn into_item(self) -> T {
        self.item
    }
}

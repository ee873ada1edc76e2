//! Per-(user, trading_day) RMS counters (spec.md §3, §4.4).
//!
//! Mutated only inside the RMS Gate under the per-user counter lock
//! (spec.md §9's "two orthogonal lock domains" note) — this is the
//! *counter* lock domain, distinct from `fulcrum-execution::registry`'s
//! per-`BrokerLink` session-refresh lock.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RmsCounters {
    pub trading_day: NaiveDate,
    pub realized_pnl_today: Decimal,
    pub lots_today: u64,
    pub open_notional: Decimal,
    /// High-water mark of `realized_pnl_today` within the session, used by
    /// the enforcement sweep's drawdown check (spec.md §4.4).
    pub session_peak_pnl: Decimal,
    /// Lots/notional reserved by accepted-but-not-yet-finalised legs.
    pub reserved_lots: u64,
    pub reserved_notional: Decimal,
}

impl RmsCounters {
    pub fn new_for_day(trading_day: NaiveDate) -> Self {
        Self {
            trading_day,
            realized_pnl_today: Decimal::ZERO,
            lots_today: 0,
            open_notional: Decimal::ZERO,
            session_peak_pnl: Decimal::ZERO,
            reserved_lots: 0,
            reserved_notional: Decimal::ZERO,
        }
    }

    /// Rolls the counters over if `now`'s exchange-local date has moved
    /// past `trading_day`. Open reservations do not survive a roll — a
    /// leg that was mid-flight across a day boundary is a pathological
    /// case the orchestrator's run-level deadlines are expected to
    /// prevent in practice.
    pub fn roll_if_stale(&mut self, today: NaiveDate) {
        if today != self.trading_day {
            *self = Self::new_for_day(today);
        }
    }

    pub fn lots_after_reservation(&self, lots: u64) -> u64 {
        self.lots_today + self.reserved_lots + lots
    }
}

/// A provisional hold against a user's daily counters for one leg,
/// released on finalisation (spec.md §4.4: "reservations are released on
/// leg finalisation; accepted→filled keeps them, rejected/error releases").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub lots: u64,
    pub notional: Decimal,
}

pub fn exchange_today(tz: chrono_tz::Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

//! The RMS pre-trade gate (spec.md §4.4).
//!
//! `pre_trade` is called once per leg, under the per-user counter lock.
//! Broker I/O never happens while this lock is held — only the in-memory
//! counter mutation does, matching spec.md §9's "broker I/O happens
//! outside the lock" rationale.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use fulcrum_markets::{AccountId, UserId};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    config::RmsConfig,
    counters::{exchange_today, Reservation, RmsCounters},
    RiskApproved, RiskRefused,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLeg {
    pub account: AccountId,
    pub lots: u64,
    pub lot_size: u64,
    pub ref_price: Decimal,
    pub available_margin: Decimal,
}

impl RiskLeg {
    pub fn notional(&self) -> Decimal {
        Decimal::from(self.lots) * Decimal::from(self.lot_size) * self.ref_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RmsRejection {
    MaxLotsPerOrder { limit: u64, attempted: u64 },
    MaxDailyLots { limit: u64, would_be: u64 },
    ExposureLimit { limit: Decimal, would_be: Decimal },
    InsufficientMargin { required: Decimal, available: Decimal },
    DailyLossTripped { limit: Decimal, realized: Decimal },
}

impl RmsRejection {
    /// Error envelope code (spec.md §6).
    pub fn code(&self) -> &'static str {
        match self {
            Self::MaxLotsPerOrder { .. } | Self::MaxDailyLots { .. } => "RMS_MAX_LOTS",
            Self::ExposureLimit { .. } => "RMS_EXPOSURE",
            Self::InsufficientMargin { .. } => "RMS_MARGIN",
            Self::DailyLossTripped { .. } => "RMS_MAX_LOSS",
        }
    }
}

impl std::fmt::Display for RmsRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxLotsPerOrder { limit, attempted } => {
                write!(f, "leg lots {attempted} exceed max_lots_per_order {limit}")
            }
            Self::MaxDailyLots { limit, would_be } => {
                write!(f, "would bring lots_today to {would_be}, exceeding max_daily_lots {limit}")
            }
            Self::ExposureLimit { limit, would_be } => {
                write!(f, "would bring open_notional to {would_be}, exceeding exposure_limit {limit}")
            }
            Self::InsufficientMargin { required, available } => {
                write!(f, "requires margin {required}, only {available} available")
            }
            Self::DailyLossTripped { limit, realized } => {
                write!(f, "realized_pnl_today {realized} already breaches max_daily_loss {limit}")
            }
        }
    }
}

impl std::error::Error for RmsRejection {}

/// Holds per-user `RmsConfig` and `RmsCounters`, serialising counter
/// mutations for a single user behind `parking_lot::Mutex` while leaving
/// distinct users fully independent (spec.md §5).
#[derive(Debug, Default)]
pub struct LegRiskManager {
    configs: DashMap<UserId, RmsConfig>,
    counters: DashMap<UserId, Arc<Mutex<RmsCounters>>>,
}

impl LegRiskManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&self, user: UserId, config: RmsConfig) {
        self.configs.insert(user, config);
    }

    fn config_for(&self, user: UserId) -> RmsConfig {
        self.configs.get(&user).map(|c| c.clone()).unwrap_or_default()
    }

    fn counters_for(&self, user: UserId) -> Arc<Mutex<RmsCounters>> {
        Arc::clone(
            self.counters
                .entry(user)
                .or_insert_with(|| Arc::new(Mutex::new(RmsCounters::new_for_day(chrono::Utc::now().date_naive()))))
                .value(),
        )
    }

    /// Snapshots the current counters for `user` (eg/ for `/rms/status`).
    pub fn counters_snapshot(&self, user: UserId, now: DateTime<Utc>) -> RmsCounters {
        let config = self.config_for(user);
        let today = exchange_today(config.exchange_timezone, now);
        let counters = self.counters_for(user);
        let mut guard = counters.lock();
        guard.roll_if_stale(today);
        guard.clone()
    }

    pub fn pre_trade(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        leg: RiskLeg,
    ) -> Result<RiskApproved<Reservation>, RiskRefused<RiskLeg, RmsRejection>> {
        let config = self.config_for(user);
        let today = exchange_today(config.exchange_timezone, now);
        let counters_lock = self.counters_for(user);
        let mut counters = counters_lock.lock();
        counters.roll_if_stale(today);

        if let Some(max) = config.max_lots_per_order {
            if leg.lots > max {
                let attempted = leg.lots;
                return Err(RiskRefused::new(
                    leg,
                    RmsRejection::MaxLotsPerOrder {
                        limit: max,
                        attempted,
                    },
                ));
            }
        }

        let would_be_lots = counters.lots_after_reservation(leg.lots);
        if would_be_lots > config.max_daily_lots {
            return Err(RiskRefused::new(
                leg,
                RmsRejection::MaxDailyLots {
                    limit: config.max_daily_lots,
                    would_be: would_be_lots,
                },
            ));
        }

        let notional = leg.notional();
        let would_be_notional = counters.open_notional + counters.reserved_notional + notional;
        if would_be_notional > config.exposure_limit {
            return Err(RiskRefused::new(
                leg,
                RmsRejection::ExposureLimit {
                    limit: config.exposure_limit,
                    would_be: would_be_notional,
                },
            ));
        }

        let required_margin = notional * (Decimal::ONE + config.margin_buffer_pct);
        if leg.available_margin < required_margin {
            let available = leg.available_margin;
            return Err(RiskRefused::new(
                leg,
                RmsRejection::InsufficientMargin {
                    required: required_margin,
                    available,
                },
            ));
        }

        if counters.realized_pnl_today <= -config.max_daily_loss {
            return Err(RiskRefused::new(
                leg,
                RmsRejection::DailyLossTripped {
                    limit: config.max_daily_loss,
                    realized: counters.realized_pnl_today,
                },
            ));
        }

        counters.lots_today += leg.lots;
        counters.open_notional += notional;
        counters.reserved_lots += leg.lots;
        counters.reserved_notional += notional;

        Ok(RiskApproved::new(Reservation {
            lots: leg.lots,
            notional,
        }))
    }

    /// Leg reached a terminal success (`accepted`/`filled`): the
    /// reservation becomes permanent, only the reserved markers clear.
    pub fn commit(&self, user: UserId, reservation: Reservation) {
        let counters_lock = self.counters_for(user);
        let mut counters = counters_lock.lock();
        counters.reserved_lots = counters.reserved_lots.saturating_sub(reservation.lots);
        counters.reserved_notional -= reservation.notional;
    }

    /// Leg reached a terminal failure (`rejected`/`error`): fully unwind
    /// the reservation from both the live and reserved counters.
    pub fn release(&self, user: UserId, reservation: Reservation) {
        let counters_lock = self.counters_for(user);
        let mut counters = counters_lock.lock();
        counters.lots_today = counters.lots_today.saturating_sub(reservation.lots);
        counters.open_notional -= reservation.notional;
        counters.reserved_lots = counters.reserved_lots.saturating_sub(reservation.lots);
        counters.reserved_notional -= reservation.notional;
    }

    pub fn record_realized_pnl(&self, user: UserId, now: DateTime<Utc>, delta: Decimal) {
        let config = self.config_for(user);
        let today = exchange_today(config.exchange_timezone, now);
        let counters_lock = self.counters_for(user);
        let mut counters = counters_lock.lock();
        counters.roll_if_stale(today);
        counters.realized_pnl_today += delta;
        counters.session_peak_pnl = counters.session_peak_pnl.max(counters.realized_pnl_today);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulcrum_markets::Id;
    use rust_decimal_macros::dec;

    fn leg(lots: u64) -> RiskLeg {
        RiskLeg {
            account: Id::new(),
            lots,
            lot_size: 1,
            ref_price: dec!(100),
            available_margin: dec!(1_000_000),
        }
    }

    #[test]
    fn s3_rms_trip_accepts_until_daily_cap_then_rejects() {
        let gate = LegRiskManager::new();
        let user: UserId = Id::new();
        gate.set_config(
            user,
            RmsConfig {
                max_daily_lots: 5,
                ..RmsConfig::default()
            },
        );
        let now = Utc::now();

        // Pre-seed counters as if 4 lots were already traded today.
        {
            let counters_lock = gate.counters_for(user);
            let mut counters = counters_lock.lock();
            counters.roll_if_stale(counters.trading_day);
            counters.lots_today = 4;
        }

        let first = gate.pre_trade(user, now, leg(1));
        assert!(first.is_ok());

        let second = gate.pre_trade(user, now, leg(1));
        assert!(matches!(
            second.unwrap_err().reason,
            RmsRejection::MaxDailyLots { .. }
        ));
    }

    #[test]
    fn distinct_users_do_not_contend_on_the_same_counters() {
        let gate = LegRiskManager::new();
        let user_a: UserId = Id::new();
        let user_b: UserId = Id::new();
        gate.set_config(
            user_a,
            RmsConfig {
                max_daily_lots: 1,
                ..RmsConfig::default()
            },
        );
        gate.set_config(
            user_b,
            RmsConfig {
                max_daily_lots: 100,
                ..RmsConfig::default()
            },
        );

        let now = Utc::now();
        assert!(gate.pre_trade(user_a, now, leg(1)).is_ok());
        assert!(gate.pre_trade(user_a, now, leg(1)).is_err());
        assert!(gate.pre_trade(user_b, now, leg(50)).is_ok());
    }

    #[test]
    fn release_unwinds_reservation_fully() {
        let gate = LegRiskManager::new();
        let user: UserId = Id::new();
        gate.set_config(user, RmsConfig::default());
        let now = Utc::now();

        let approved = gate.pre_trade(user, now, leg(3)).unwrap().into_item();
        gate.release(user, approved);

        let snapshot = gate.counters_snapshot(user, now);
        assert_eq!(snapshot.lots_today, 0);
        assert_eq!(snapshot.reserved_lots, 0);
    }
}

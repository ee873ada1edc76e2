//! The enforcement sweep (spec.md §4.4's in-trade phase).
//!
//! Unlike the gate, the sweep does not block order flow — it runs
//! periodically against each user's live counters and raises
//! [`RiskAlert`]s that a caller (the orchestrator or a notification
//! sink) acts on: square the book off, tighten a trailing stop, or just
//! notify. The sweep never mutates counters itself.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{config::RmsConfig, counters::RmsCounters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RiskAlertType {
    DailyLossTripped {
        realized: Decimal,
        limit: Decimal,
    },
    AutoSquareOffTriggered {
        reason: String,
    },
    ProfitLockTightened {
        realized: Decimal,
        profit_lock: Decimal,
        new_trailing_sl: Decimal,
    },
    DrawdownBreached {
        peak: Decimal,
        current: Decimal,
        drawdown: Decimal,
        limit: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub alert_type: RiskAlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub metrics: HashMap<String, Decimal>,
}

impl RiskAlert {
    fn new(alert_type: RiskAlertType, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            alert_type,
            severity,
            message: message.into(),
            metrics: HashMap::new(),
        }
    }

    fn with_metric(mut self, key: &str, value: Decimal) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }
}

/// Whether the sweep's findings call for closing out open positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    pub alerts: Vec<RiskAlert>,
    pub square_off: bool,
    pub tighten_trailing_sl_to: Option<Decimal>,
}

#[derive(Debug, Default)]
pub struct EnforcementSweep;

impl EnforcementSweep {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates one user's counters against their `RmsConfig` and
    /// returns every alert that applies. Pure and side-effect free —
    /// the caller decides what to do with `square_off`.
    pub fn evaluate(&self, config: &RmsConfig, counters: &RmsCounters) -> SweepOutcome {
        let mut alerts = Vec::new();
        let mut square_off = false;
        let mut tighten_trailing_sl_to = None;

        if counters.realized_pnl_today <= -config.max_daily_loss {
            alerts.push(
                RiskAlert::new(
                    RiskAlertType::DailyLossTripped {
                        realized: counters.realized_pnl_today,
                        limit: config.max_daily_loss,
                    },
                    AlertSeverity::Critical,
                    "realized daily loss has tripped max_daily_loss",
                )
                .with_metric("realized_pnl_today", counters.realized_pnl_today)
                .with_metric("max_daily_loss", config.max_daily_loss),
            );

            if config.auto_square_off_enabled {
                square_off = true;
                alerts.push(RiskAlert::new(
                    RiskAlertType::AutoSquareOffTriggered {
                        reason: "max_daily_loss".to_string(),
                    },
                    AlertSeverity::Critical,
                    "auto square-off triggered by daily loss trip",
                ));
            }
        }

        if let (Some(profit_lock), Some(trailing_delta)) =
            (config.profit_lock, config.trailing_sl_delta)
        {
            if counters.session_peak_pnl >= profit_lock {
                let new_sl = counters.session_peak_pnl - trailing_delta;
                tighten_trailing_sl_to = Some(new_sl);
                alerts.push(
                    RiskAlert::new(
                        RiskAlertType::ProfitLockTightened {
                            realized: counters.realized_pnl_today,
                            profit_lock,
                            new_trailing_sl: new_sl,
                        },
                        AlertSeverity::Info,
                        "profit lock engaged, trailing stop tightened",
                    )
                    .with_metric("session_peak_pnl", counters.session_peak_pnl),
                );
            }
        }

        if let Some(drawdown_limit) = config.drawdown_limit {
            let drawdown = counters.session_peak_pnl - counters.realized_pnl_today;
            if drawdown >= drawdown_limit {
                alerts.push(
                    RiskAlert::new(
                        RiskAlertType::DrawdownBreached {
                            peak: counters.session_peak_pnl,
                            current: counters.realized_pnl_today,
                            drawdown,
                            limit: drawdown_limit,
                        },
                        AlertSeverity::Critical,
                        "drawdown from session peak has breached drawdown_limit",
                    )
                    .with_metric("drawdown", drawdown),
                );
                if config.auto_square_off_enabled {
                    square_off = true;
                }
            }
        }

        SweepOutcome {
            alerts,
            square_off,
            tighten_trailing_sl_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn counters_with(realized: Decimal, peak: Decimal) -> RmsCounters {
        let mut counters = RmsCounters::new_for_day(chrono::Utc::now().date_naive());
        counters.realized_pnl_today = realized;
        counters.session_peak_pnl = peak;
        counters
    }

    #[test]
    fn daily_loss_trip_triggers_square_off_when_enabled() {
        let sweep = EnforcementSweep::new();
        let config = RmsConfig {
            max_daily_loss: dec!(1000),
            auto_square_off_enabled: true,
            ..RmsConfig::default()
        };
        let counters = counters_with(dec!(-1500), dec!(200));

        let outcome = sweep.evaluate(&config, &counters);
        assert!(outcome.square_off);
        assert!(outcome
            .alerts
            .iter()
            .any(|a| matches!(a.alert_type, RiskAlertType::DailyLossTripped { .. })));
    }

    #[test]
    fn profit_lock_tightens_trailing_stop_from_session_peak() {
        let sweep = EnforcementSweep::new();
        let config = RmsConfig {
            profit_lock: Some(dec!(500)),
            trailing_sl_delta: Some(dec!(100)),
            ..RmsConfig::default()
        };
        let counters = counters_with(dec!(600), dec!(800));

        let outcome = sweep.evaluate(&config, &counters);
        assert_eq!(outcome.tighten_trailing_sl_to, Some(dec!(700)));
    }

    #[test]
    fn no_alerts_when_well_within_every_limit() {
        let sweep = EnforcementSweep::new();
        let config = RmsConfig::default();
        let counters = counters_with(dec!(50), dec!(50));

        let outcome = sweep.evaluate(&config, &counters);
        assert!(outcome.alerts.is_empty());
        assert!(!outcome.square_off);
    }
}

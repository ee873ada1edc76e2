//! Per-user RMS configuration (spec.md §3's `RmsConfig` entity).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmsConfig {
    pub max_daily_loss: Decimal,
    pub max_daily_lots: u64,
    pub max_lots_per_order: Option<u64>,
    pub exposure_limit: Decimal,
    pub margin_buffer_pct: Decimal,
    pub profit_lock: Option<Decimal>,
    pub trailing_sl_delta: Option<Decimal>,
    pub drawdown_limit: Option<Decimal>,
    pub auto_square_off_enabled: bool,
    pub auto_square_off_buffer_pct: Decimal,
    pub notify_email: Option<String>,
    pub notify_telegram: Option<String>,
    /// Exchange timezone used for the `RmsCounters` day boundary. Defaults
    /// to `Asia/Kolkata` (spec.md §9's open-question resolution).
    pub exchange_timezone: chrono_tz::Tz,
}

impl Default for RmsConfig {
    fn default() -> Self {
        Self {
            max_daily_loss: Decimal::ZERO,
            max_daily_lots: u64::MAX,
            max_lots_per_order: None,
            exposure_limit: Decimal::MAX,
            margin_buffer_pct: Decimal::ZERO,
            profit_lock: None,
            trailing_sl_delta: None,
            drawdown_limit: None,
            auto_square_off_enabled: false,
            auto_square_off_buffer_pct: Decimal::ZERO,
            notify_email: None,
            notify_telegram: None,
            exchange_timezone: chrono_tz::Asia::Kolkata,
        }
    }
}

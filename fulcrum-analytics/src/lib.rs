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

//!
//! # Analytics — financial metrics, PnL/position projections, dashboard
//!
//! This crate reads the caller's already-collected `Fill`s, execution
//! events, open positions and `StrategyRun` results and turns them into
//! the aggregates the `/analytics` endpoints expose. It never queries a
//! store itself — the Execution Event Store and Position/PnL projection
//! live upstream of this crate.
//!
//! ## Structure
//!
//! ```text
//! analytics/
//!  ├─ metric/          # Sharpe, Win Rate, Profit Factor
//!  ├─ time.rs          # Time interval conventions (Daily, Annual252, Annual365)
//!  ├─ fill.rs          # Closed-trade input to PnL aggregation
//!  ├─ pnl.rs           # Realised PnL, daily buckets
//!  ├─ positions.rs     # Open-position mark-to-market snapshot
//!  ├─ histogram.rs     # Per-run leg-status counts
//!  ├─ latency.rs       # p50/p95 leg latency, exact or bucketed
//!  ├─ strategy_totals.rs  # Per-strategy PnL/order rollups
//!  ├─ dashboard.rs     # The /analytics/dashboard aggregate
//!  └─ export.rs        # CSV/JSON exports with fixed column/key order
//! ```
//!
//! ## Example
//!
//! ```rust
//! use fulcrum_analytics::metric::sharpe::SharpeRatio;
//! use fulcrum_analytics::time::Daily;
//! use rust_decimal_macros::dec;
//!
//! let risk_free = dec!(0.0015);
//! let mean_ret  = dec!(0.0025);
//! let std_dev   = dec!(0.0200);
//!
//! let sharpe = SharpeRatio::calculate(risk_free, mean_ret, std_dev, Daily);
//! assert_eq!(sharpe.value, dec!(0.05));
//! ```

/// Financial metrics and methods for calculating them over different
/// [`TimeIntervals`](time::TimeInterval): Sharpe Ratio, Win Rate, Profit
/// Factor.
pub mod metric;

/// Definitions of time intervals used in financial calculations.
///
/// Supports different financial time conventions such as `Annual365`,
/// `Annual252` (business days), `Daily`, etc. for precise calculations
/// of annualized and periodic metrics.
pub mod time;

pub mod dashboard;
pub mod export;
pub mod fill;
pub mod histogram;
pub mod latency;
pub mod pnl;
pub mod positions;
pub mod strategy_totals;

pub use dashboard::{Dashboard, DashboardInputs};
pub use export::ExportError;
pub use fill::Fill;
pub use histogram::LegStatusHistogram;
pub use latency::LatencyPercentiles;
pub use pnl::DailyPnl;
pub use positions::OpenPosition;
pub use strategy_totals::StrategyTotals;

use chrono::{DateTime, Utc};

/// Trait for types that have a timestamp.
///
/// Defines the standard interface for objects that carry temporal information,
/// essential for time-based analysis and chronological ordering.
pub trait Timed {
    /// Returns the timestamp of this item.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Wrapper structure that combines a value with a timestamp.
///
/// Useful for associating financial data with their specific timestamps,
/// allowing precise temporal analysis and chronological ordering.
///
/// # Example
/// ```rust
/// use fulcrum_analytics::{TimedValue, Timed};
/// use chrono::Utc;
///
/// let price = TimedValue::new(100.50_f64, Utc::now());
/// assert!(price.timestamp() <= Utc::now());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimedValue<T> {
    /// The value associated with the timestamp
    pub value: T,
    /// UTC timestamp of the value
    pub timestamp: DateTime<Utc>,
}

impl<T> TimedValue<T> {
    /// Creates a new `TimedValue` with the provided value and timestamp.
    pub fn new(value: T, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }
}

impl<T> Timed for TimedValue<T> {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
pub mod test_utils {
    //! Utilities for testing the analytics module.
    //!
    //! Provides helper functions for creating test data
    //! and manipulating time in test scenarios.

    use chrono::{DateTime, Utc};

    /// Adds days to a base date for creating test data.
    ///
    /// Useful for generating test time series with specific intervals
    /// between observations.
    pub fn time_plus_days(base: DateTime<Utc>, plus: u64) -> DateTime<Utc> {
        base + chrono::Duration::days(plus as i64)
    }
}

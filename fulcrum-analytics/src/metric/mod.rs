//! # Financial Metrics
//!
//! Risk-adjusted performance metrics, computed from pre-aggregated return
//! statistics rather than raw tick series.
//!
//! ## Example
//!
//! ```rust
//! use fulcrum_analytics::metric::sharpe::SharpeRatio;
//! use fulcrum_analytics::time::Daily;
//! use rust_decimal_macros::dec;
//!
//! let risk_free = dec!(0.0015); // 0.15%
//! let mean_ret = dec!(0.0025); // 0.25%
//! let std_dev = dec!(0.0200); // 2.00%
//!
//! let sharpe = SharpeRatio::calculate(risk_free, mean_ret, std_dev, Daily);
//! assert_eq!(sharpe.value, dec!(0.05));
//! ```

/// Ratio of gross profit to gross loss.
pub mod profit_factor;

/// Risk-adjusted return per unit of volatility.
pub mod sharpe;

/// Percentage of trades that closed in profit.
pub mod win_rate;

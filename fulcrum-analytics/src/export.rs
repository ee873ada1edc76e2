//! CSV/JSON exports with the stable column/key orders spec.md §6 fixes
//! per endpoint.

use serde::Serialize;
use thiserror::Error;

use crate::{histogram::LegStatusHistogram, latency::LatencyPercentiles, pnl::DailyPnl};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// `GET /analytics/exports/daily-pnl`: columns
/// `date,realized_pnl,unrealized_pnl,trade_count`, rows in ascending
/// ISO-date order (spec.md §6) — the order `daily_pnl` already returns
/// them in, so this just serialises.
pub fn daily_pnl_csv(rows: &[DailyPnl]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|error| csv::Error::from(error.into_error()))?;
    Ok(String::from_utf8(bytes).expect("csv writer only emits UTF-8 from Display/Serialize decimal and date types"))
}

/// `GET /analytics/exports/latency-summary`: JSON object preserving
/// struct field declaration order (`count, p50_ms, p95_ms, approximate`).
pub fn latency_summary_json(summary: &LatencyPercentiles) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// `GET /analytics/exports/leg-status`: JSON object preserving the
/// histogram's declared field order.
pub fn leg_status_json(histogram: &LegStatusHistogram) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(histogram)?)
}

/// Generic JSON export for any `Serialize` type, used for endpoints
/// spec.md §6 doesn't single out a format for.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn daily_pnl_csv_has_the_fixed_column_order_and_header() {
        let rows = vec![DailyPnl {
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            realized_pnl: dec!(10.5),
            unrealized_pnl: dec!(-2.0),
            trade_count: 3,
        }];
        let csv = daily_pnl_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), "date,realized_pnl,unrealized_pnl,trade_count");
        assert_eq!(lines.next().unwrap(), "2026-01-01,10.5,-2.0,3");
    }

    #[test]
    fn leg_status_json_preserves_field_order() {
        let histogram = LegStatusHistogram { accepted: 2, rejected: 1, ..Default::default() };
        let json = leg_status_json(&histogram).unwrap();
        let accepted_pos = json.find("requested").unwrap();
        let rejected_pos = json.find("accepted").unwrap();
        assert!(accepted_pos < rejected_pos);
    }
}

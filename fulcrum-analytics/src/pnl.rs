//! Realised/unrealised PnL aggregation, overall and per day (spec.md
//! §4.9). CSV export column order for `daily-pnl` is fixed by spec.md §6:
//! `date,realized_pnl,unrealized_pnl,trade_count`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::fill::Fill;

/// One day's realised/unrealised PnL and trade count. Field order matches
/// the CSV export's fixed column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub trade_count: u64,
}

/// Buckets `fills` by their `closed_at` UTC date and sums realised PnL and
/// trade count per day. `unrealized_pnl_by_day` attributes an optional
/// end-of-day mark-to-market figure per date (absent days default to
/// zero) — computed by the caller from open positions and current prices,
/// since this crate has no market-data access of its own.
///
/// Returns days in ascending ISO-date order (spec.md §6).
pub fn daily_pnl(fills: &[Fill], unrealized_pnl_by_day: &BTreeMap<NaiveDate, Decimal>) -> Vec<DailyPnl> {
    let mut by_day: BTreeMap<NaiveDate, (Decimal, u64)> = BTreeMap::new();
    for fill in fills {
        let date = fill.closed_at.date_naive();
        let entry = by_day.entry(date).or_insert((Decimal::ZERO, 0));
        entry.0 += fill.realized_pnl;
        entry.1 += 1;
    }
    for date in unrealized_pnl_by_day.keys() {
        by_day.entry(*date).or_insert((Decimal::ZERO, 0));
    }

    by_day
        .into_iter()
        .map(|(date, (realized_pnl, trade_count))| DailyPnl {
            date,
            realized_pnl,
            unrealized_pnl: unrealized_pnl_by_day.get(&date).copied().unwrap_or(Decimal::ZERO),
            trade_count,
        })
        .collect()
}

/// Sum of realised PnL across all fills, regardless of day.
pub fn total_realized_pnl(fills: &[Fill]) -> Decimal {
    fills.iter().map(|fill| fill.realized_pnl).sum()
}

/// Per-symbol realised PnL, insertion order of first appearance preserved
/// via `indexmap` rather than alphabetised — matches the ordering
/// convention `fulcrum-allocation` uses for mapping order.
pub fn realized_pnl_by_symbol(fills: &[Fill]) -> indexmap::IndexMap<SmolStr, Decimal> {
    let mut totals = indexmap::IndexMap::new();
    for fill in fills {
        *totals.entry(fill.symbol.clone()).or_insert(Decimal::ZERO) += fill.realized_pnl;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fulcrum_markets::Id;
    use rust_decimal_macros::dec;

    fn fill(day: u32, pnl: Decimal) -> Fill {
        Fill {
            run: Id::new(),
            strategy: None,
            symbol: "NIFTY".into(),
            realized_pnl: pnl,
            closed_at: Utc.with_ymd_and_hms(2026, 1, day, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn buckets_fills_by_day_in_ascending_order() {
        let fills = vec![fill(3, dec!(10)), fill(1, dec!(-5)), fill(1, dec!(5)), fill(3, dec!(2))];
        let result = daily_pnl(&fills, &BTreeMap::new());

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].date, chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(result[0].realized_pnl, dec!(0));
        assert_eq!(result[0].trade_count, 2);
        assert_eq!(result[1].realized_pnl, dec!(12));
        assert_eq!(result[1].trade_count, 2);
    }

    #[test]
    fn a_day_with_only_unrealized_pnl_still_appears() {
        let mut unrealized = BTreeMap::new();
        let date = chrono::NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        unrealized.insert(date, dec!(42));

        let result = daily_pnl(&[], &unrealized);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].trade_count, 0);
        assert_eq!(result[0].unrealized_pnl, dec!(42));
    }
}

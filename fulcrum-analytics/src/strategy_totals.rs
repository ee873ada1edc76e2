//! Per-strategy totals across `StrategyRun`s (spec.md §4.9).

use fulcrum_trader::{ResultMetrics, StrategyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StrategyTotals {
    pub pnl: Decimal,
    pub orders: u64,
    pub total_lots: u64,
}

impl StrategyTotals {
    fn fold(&mut self, metrics: &ResultMetrics) {
        self.pnl += metrics.pnl;
        self.orders += metrics.orders;
        self.total_lots += metrics.total_lots;
    }
}

/// Sums each `StrategyRun`'s `result_metrics` into a per-strategy total.
/// Insertion order is the first-seen order of `(strategy, result_metrics)`
/// pairs, preserved via `indexmap` rather than alphabetised by id.
pub fn totals_by_strategy<'a>(
    runs: impl IntoIterator<Item = (StrategyId, &'a ResultMetrics)>,
) -> indexmap::IndexMap<StrategyId, StrategyTotals> {
    let mut totals = indexmap::IndexMap::new();
    for (strategy, metrics) in runs {
        totals.entry(strategy).or_insert_with(StrategyTotals::default).fold(metrics);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use fulcrum_markets::Id;
    use rust_decimal_macros::dec;

    #[test]
    fn sums_metrics_across_runs_for_the_same_strategy() {
        let strategy: StrategyId = Id::new();
        let a = ResultMetrics { pnl: dec!(10), orders: 2, total_lots: 5, avg_latency_ms: None, execution_run_ids: vec![] };
        let b = ResultMetrics { pnl: dec!(-3), orders: 1, total_lots: 2, avg_latency_ms: None, execution_run_ids: vec![] };

        let totals = totals_by_strategy([(strategy, &a), (strategy, &b)]);
        let total = totals.get(&strategy).unwrap();
        assert_eq!(total.pnl, dec!(7));
        assert_eq!(total.orders, 3);
        assert_eq!(total.total_lots, 7);
    }
}

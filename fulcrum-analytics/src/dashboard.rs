//! The `/analytics/dashboard` aggregate (spec.md §4.9, §6): everything the
//! dashboard endpoint needs in one response, assembled from inputs the
//! caller already has on hand (this crate never queries a store itself).

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use fulcrum_core::ExecutionEvent;
use fulcrum_markets::BrokerPosition;
use fulcrum_trader::{ResultMetrics, StrategyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{
    fill::Fill,
    histogram::LegStatusHistogram,
    latency::{self, LatencyPercentiles},
    pnl::{self, DailyPnl},
    positions::{self, OpenPosition},
    strategy_totals::{self, StrategyTotals},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub open_positions: Vec<OpenPosition>,
    pub daily_pnl: Vec<DailyPnl>,
    pub strategies: indexmap::IndexMap<StrategyId, StrategyTotals>,
    pub execution_run_count: u64,
    pub failed_run_count: u64,
    pub leg_status: LegStatusHistogram,
    pub latency: Option<LatencyPercentiles>,
}

/// Everything [`Dashboard`] is built from — kept as one struct so call
/// sites don't thread eight loose parameters through `build`.
#[derive(Debug, Clone, Default)]
pub struct DashboardInputs<'a> {
    pub fills: &'a [Fill],
    pub open_positions: &'a [BrokerPosition],
    pub last_prices: HashMap<SmolStr, Decimal>,
    pub strategy_runs: Vec<(StrategyId, ResultMetrics)>,
    pub execution_run_count: u64,
    pub failed_run_count: u64,
    pub events: &'a [ExecutionEvent],
    pub leg_latencies_ms: Vec<i64>,
    pub latency_bucket_ms: i64,
    /// End-of-day mark-to-market unrealised PnL, keyed by date. Historical
    /// daily snapshots are this crate's input, not something it derives —
    /// it has no access to historical position state.
    pub unrealized_pnl_by_day: BTreeMap<NaiveDate, Decimal>,
}

pub fn build(inputs: DashboardInputs<'_>) -> Dashboard {
    let open_positions = positions::snapshot(inputs.open_positions, &inputs.last_prices);
    let unrealized_pnl = positions::total_unrealized_pnl(&open_positions);
    let realized_pnl = pnl::total_realized_pnl(inputs.fills);
    let daily_pnl = pnl::daily_pnl(inputs.fills, &inputs.unrealized_pnl_by_day);

    let strategies =
        strategy_totals::totals_by_strategy(inputs.strategy_runs.iter().map(|(strategy, metrics)| (*strategy, metrics)));

    let leg_status = LegStatusHistogram::from_events(inputs.events);
    let latency = latency::percentiles(&inputs.leg_latencies_ms, inputs.latency_bucket_ms);

    Dashboard {
        realized_pnl,
        unrealized_pnl,
        open_positions,
        daily_pnl,
        strategies,
        execution_run_count: inputs.execution_run_count,
        failed_run_count: inputs.failed_run_count,
        leg_status,
        latency,
    }
}

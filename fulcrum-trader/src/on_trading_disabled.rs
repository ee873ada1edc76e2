//! Hook fired when a Strategy's error budget is exceeded and its status
//! flips to `stopped` (spec.md §4.7's "errors exceeding a configured count
//! within a window transition the Strategy to stopped"). Supplementary
//! feature grounded in the teacher's `OnTradingDisabled` hook-trait shape,
//! simplified to this workspace's concrete `StrategyId`.

use crate::model::StrategyId;

pub trait OnTradingDisabled: Sized {
    type OnTradingDisabled;

    fn on_trading_disabled(&self, strategy: StrategyId) -> Self::OnTradingDisabled;
}

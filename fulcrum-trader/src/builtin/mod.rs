//! `type=built-in` reference strategies (spec.md §3's `Strategy.type`),
//! grounded in the teacher's `order_book_imbalance` reusable-example shape:
//! a thin config/state pair implementing [`crate::algo::AlgoStrategy`].

mod buy_and_hold;
mod threshold_cross;

pub use buy_and_hold::{BuyAndHoldState, BuyAndHoldStrategy};
pub use threshold_cross::{ThresholdCrossConfig, ThresholdCrossState, ThresholdCrossStrategy};

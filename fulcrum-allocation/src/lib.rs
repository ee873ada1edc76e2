#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! # Allocation — deterministic lot-split planner (spec.md §4.3)
//!
//! Takes an [`ExecutionGroup`]'s account mappings and a total lot count
//! and produces an [`Allocation`] that sums exactly to that total, using
//! fixed-first assignment, then a weighted/proportional split of the
//! remainder by largest-remainder rounding. The Orchestrator
//! (`fulcrum-core`) is the only caller; the RMS Gate (`fulcrum-risk`)
//! consumes the resulting per-account legs.

use std::cmp::Ordering;

use derive_more::Constructor;
use fulcrum_markets::AccountId;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationMode {
    Proportional,
    Fixed,
    Weighted,
}

/// One account's membership in an `ExecutionGroup`. Invariant
/// (`policy=weighted ⇒ weight>0`, `policy=fixed ⇒ fixed_lots∈ℕ⁺`) is
/// enforced by [`GroupAccountMapping::new`], not by the type alone —
/// matching spec.md §3's constructor-time validation framing for
/// `TradeIntent`/`Allocation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAccountMapping {
    pub account: AccountId,
    pub mode: AllocationMode,
    pub weight: Option<Decimal>,
    pub fixed_lots: Option<u64>,
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("policy=weighted requires weight > 0")]
    MissingOrZeroWeight,
    #[error("policy=fixed requires fixed_lots > 0")]
    MissingOrZeroFixedLots,
}

impl GroupAccountMapping {
    pub fn new(
        account: AccountId,
        mode: AllocationMode,
        weight: Option<Decimal>,
        fixed_lots: Option<u64>,
    ) -> Result<Self, MappingError> {
        match mode {
            AllocationMode::Weighted if !weight.is_some_and(|w| w > Decimal::ZERO) => {
                Err(MappingError::MissingOrZeroWeight)
            }
            AllocationMode::Fixed if !fixed_lots.is_some_and(|l| l > 0) => {
                Err(MappingError::MissingOrZeroFixedLots)
            }
            _ => Ok(Self {
                account,
                mode,
                weight,
                fixed_lots,
            }),
        }
    }
}

/// Per-account trace of how its final lot count was derived, retained
/// even for accounts excluded from dispatch (spec.md §4.3 rule 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Constructor)]
pub struct PolicyTrace {
    pub mode: AllocationMode,
    pub fixed_requested: Option<u64>,
    pub weight: Option<Decimal>,
    pub floor_lots: u64,
    pub remainder_lots: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Constructor)]
pub struct AccountAllocation {
    pub account: AccountId,
    pub lots: u64,
    pub policy_trace: PolicyTrace,
}

/// Deterministic lot-split result. `entries` includes zero-lot accounts
/// for observability; [`Allocation::dispatchable`] filters them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub total_lots: u64,
    pub entries: Vec<AccountAllocation>,
}

impl Allocation {
    pub fn dispatchable(&self) -> impl Iterator<Item = &AccountAllocation> {
        self.entries.iter().filter(|entry| entry.lots > 0)
    }

    pub fn sum_lots(&self) -> u64 {
        self.entries.iter().map(|entry| entry.lots).sum()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("NO_ELIGIBLE_ACCOUNTS")]
    NoEligibleAccounts,
}

/// Plans a deterministic split of `total_lots` across `mappings`,
/// following spec.md §4.3's four ordered rules.
pub fn plan(mappings: &[GroupAccountMapping], total_lots: u64) -> Result<Allocation, AllocationError> {
    if mappings.is_empty() {
        return Err(AllocationError::NoEligibleAccounts);
    }

    // Rule 1: fixed-first, in mapping order, clipped to remaining L.
    let mut remaining = total_lots;
    let mut fixed_assigned: Vec<Option<u64>> = vec![None; mappings.len()];
    for (idx, mapping) in mappings.iter().enumerate() {
        if mapping.mode != AllocationMode::Fixed {
            continue;
        }
        let requested = mapping.fixed_lots.unwrap_or(0);
        let assigned = requested.min(remaining);
        remaining -= assigned;
        fixed_assigned[idx] = Some(assigned);
    }

    // Rule 2: weighted split of the remainder R. Proportional accounts
    // act as weight=1 in a mixed pool; if no weighted accounts exist,
    // they split R evenly.
    let pool_indices: Vec<usize> = mappings
        .iter()
        .enumerate()
        .filter(|(_, m)| m.mode != AllocationMode::Fixed)
        .map(|(idx, _)| idx)
        .collect();

    let has_weighted = pool_indices
        .iter()
        .any(|&idx| mappings[idx].mode == AllocationMode::Weighted);

    let weight_of = |mapping: &GroupAccountMapping| -> Decimal {
        match mapping.mode {
            AllocationMode::Weighted => mapping.weight.unwrap_or(Decimal::ZERO),
            AllocationMode::Proportional if has_weighted => Decimal::ONE,
            AllocationMode::Proportional => Decimal::ZERO, // unused: even split path below
            AllocationMode::Fixed => unreachable!("fixed accounts excluded from pool"),
        }
    };

    let r = Decimal::from(remaining);
    let mut floor_lots = vec![0u64; mappings.len()];
    let mut fractions = vec![Decimal::ZERO; mappings.len()];

    if has_weighted {
        let total_weight: Decimal = pool_indices.iter().map(|&idx| weight_of(&mappings[idx])).sum();
        if total_weight > Decimal::ZERO {
            for &idx in &pool_indices {
                let raw = r * weight_of(&mappings[idx]) / total_weight;
                let floor = raw.trunc();
                floor_lots[idx] = floor.to_u64().unwrap_or(0);
                fractions[idx] = raw - floor;
            }
        }
    } else if !pool_indices.is_empty() {
        // Purely proportional pool: even split; the remainder is handed
        // out by rule 3 below, which falls back to mapping order when
        // every account is tied (fraction 0, the default).
        let k = pool_indices.len() as u64;
        let even = remaining / k;
        for &idx in &pool_indices {
            floor_lots[idx] = even;
        }
    }

    // Rule 3: distribute leftover from flooring, descending fraction,
    // ties broken by mapping order. `final_lots` starts as a copy of the
    // pre-bump floor so the trace can still report each account's floor
    // contribution separately from its rule-3 bump.
    let distributed: u64 = pool_indices.iter().map(|&idx| floor_lots[idx]).sum();
    let mut leftover = remaining.saturating_sub(distributed);
    let mut final_lots = floor_lots.clone();

    if has_weighted {
        let mut order: Vec<usize> = pool_indices.clone();
        order.sort_by(|&a, &b| match fractions[b].partial_cmp(&fractions[a]) {
            Some(Ordering::Equal) | None => a.cmp(&b),
            Some(other) => other,
        });
        for idx in order {
            if leftover == 0 {
                break;
            }
            final_lots[idx] += 1;
            leftover -= 1;
        }
    } else {
        // Even-split branch: ties are degenerate (fraction 0 everywhere),
        // so the leftover is simply handed out in mapping order.
        for &idx in &pool_indices {
            if leftover == 0 {
                break;
            }
            final_lots[idx] += 1;
            leftover -= 1;
        }
    }

    let entries = mappings
        .iter()
        .enumerate()
        .map(|(idx, mapping)| {
            let lots = fixed_assigned[idx].unwrap_or(final_lots[idx]);
            let trace = PolicyTrace::new(
                mapping.mode,
                mapping.fixed_lots,
                mapping.weight,
                if mapping.mode == AllocationMode::Fixed {
                    lots
                } else {
                    floor_lots[idx]
                },
                if mapping.mode == AllocationMode::Fixed {
                    0
                } else {
                    final_lots[idx].saturating_sub(floor_lots[idx])
                },
            );
            AccountAllocation::new(mapping.account, lots, trace)
        })
        .collect::<Vec<_>>();

    Ok(Allocation {
        total_lots,
        entries,
    })
}

//! Combination count calculator
//!
//! Computes the exact size of the combination space without enumerating it.
//! Mandatory slots are checked first so an invalid configuration returns 0
//! before any factorial is computed.

use shared::{PartPool, SlotRole};

use crate::core::permutation::factorial;

/// Contribution of the skills (`s`) / goals (`g`) pair
///
/// No goal means no valid sequence at all; otherwise one of `g` goals is
/// last and the remaining `s + g - 1` items are free.
pub fn pair_contribution(skills: usize, goals: usize) -> u128 {
    match (skills, goals) {
        (_, 0) => 0,
        (0, g) => factorial(g),
        (s, g) => (g as u128).saturating_mul(factorial(s + g - 1)),
    }
}

/// Indices of the constrained pair, if the layout has one
pub fn find_pair(pools: &[PartPool]) -> Option<(Option<usize>, usize)> {
    let tail = pools.iter().position(|pool| pool.role == SlotRole::PairTail)?;
    let lead = pools.iter().position(|pool| pool.role == SlotRole::PairLead);
    Some((lead, tail))
}

/// Whether the pair takes part in generation (its tail slot is switched on)
pub fn pair_enabled(pools: &[PartPool]) -> bool {
    find_pair(pools).map(|(_, tail)| pools[tail].enabled).unwrap_or(false)
}

/// Exact number of distinct combinations for a slot layout
///
/// - `Free`: `n!` for enabled non-empty pools, 1 otherwise
/// - pair: see [`pair_contribution`]; a disabled tail switches the pair off
/// - `FixedPosition`: pool length, 0 for an enabled empty pool
pub fn count_combinations(pools: &[PartPool]) -> u128 {
    // Mandatory slots first
    let pair = if pair_enabled(pools) {
        find_pair(pools).map(|(lead, tail)| {
            let skills = lead.map(|i| pools[i].active_parts().len()).unwrap_or(0);
            let goals = pools[tail].parts.len();
            pair_contribution(skills, goals)
        })
    } else {
        None
    };
    if pair == Some(0) {
        return 0;
    }
    if pools
        .iter()
        .any(|pool| pool.role == SlotRole::FixedPosition && pool.enabled && pool.is_empty())
    {
        return 0;
    }

    let mut total = pair.unwrap_or(1);
    for pool in pools {
        let factor = match pool.role {
            SlotRole::Free => factorial(pool.active_parts().len()),
            SlotRole::FixedPosition if pool.enabled => pool.len() as u128,
            SlotRole::FixedPosition | SlotRole::PairLead | SlotRole::PairTail => 1,
        };
        total = total.saturating_mul(factor);
    }
    total
}

/// Size of the space spanned by independent pools, one pick per pool
///
/// Every pool is mandatory: any empty pool makes the space empty.
pub fn count_independent<T>(pools: &[Vec<T>]) -> u128 {
    if pools.is_empty() || pools.iter().any(|pool| pool.is_empty()) {
        return 0;
    }
    pools
        .iter()
        .fold(1u128, |acc, pool| acc.saturating_mul(pool.len() as u128))
}

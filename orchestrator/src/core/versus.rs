//! Versus layout enumeration
//!
//! The versus space is the cartesian product of per-slot segment options:
//! every ordering of a free slot, every valid skills/goals interleaving for
//! the constrained pair, and one option per part for fixed positions. Only
//! the per-slot part lists are kept. An index is decoded by mixed-radix
//! arithmetic with the first slot varying slowest, and each digit is turned
//! into its segment on demand.

use shared::{Combination, MediaPart, PartPool, SlotRole};

use crate::core::counting::{find_pair, pair_contribution, pair_enabled};
use crate::core::permutation::{factorial, nth_permutation};
use crate::error::{OrchestratorError, OrchestratorResult};

/// Largest slot (or skills + goals pair) that may be fully reordered
pub const MAX_PERMUTABLE_PARTS: usize = 8;

/// Lazily indexed versus combination space
#[derive(Debug, Clone)]
pub struct VersusSpace {
    slots: Vec<Slot>,
}

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    segment: Segment,
}

#[derive(Debug, Clone)]
enum Segment {
    /// Any ordering of the parts
    Ordered(Vec<MediaPart>),
    /// Any ordering of `free` plus all goals but one, then that goal
    Tailed { free: Vec<MediaPart>, tail: Vec<MediaPart> },
    /// Exactly one of the parts
    Single(Vec<MediaPart>),
}

impl Segment {
    fn options(&self) -> u128 {
        match self {
            Segment::Ordered(parts) => factorial(parts.len()),
            Segment::Tailed { free, tail } => pair_contribution(free.len(), tail.len()),
            Segment::Single(parts) => parts.len() as u128,
        }
    }

    fn decode_into(&self, digit: u128, combination: &mut Combination) {
        match self {
            Segment::Ordered(parts) => combination.extend(nth_permutation(parts, digit)),
            Segment::Tailed { free, tail } => {
                let per_goal = factorial(free.len() + tail.len() - 1);
                let goal = (digit / per_goal) as usize;
                let rest: Vec<MediaPart> = free
                    .iter()
                    .chain(tail.iter().enumerate().filter(|(i, _)| *i != goal).map(|(_, part)| part))
                    .cloned()
                    .collect();
                combination.extend(nth_permutation(&rest, digit % per_goal));
                combination.push(tail[goal].clone());
            }
            Segment::Single(parts) => combination.push(parts[digit as usize].clone()),
        }
    }
}

impl VersusSpace {
    /// Collect the per-slot part lists, refusing slots too large to reorder
    pub fn build(pools: &[PartPool]) -> OrchestratorResult<Self> {
        let pair = if pair_enabled(pools) { find_pair(pools) } else { None };
        let pair_position = pair.map(|(lead, tail)| lead.map_or(tail, |lead| lead.min(tail)));

        let mut slots = Vec::new();
        for (index, pool) in pools.iter().enumerate() {
            match pool.role {
                SlotRole::PairLead | SlotRole::PairTail => {
                    if pair_position != Some(index) {
                        continue;
                    }
                    let Some((lead, tail)) = pair else { continue };
                    let skills = lead.map(|i| pools[i].active_parts()).unwrap_or(&[]);
                    let goals = &pools[tail].parts;
                    if skills.len() + goals.len() > MAX_PERMUTABLE_PARTS {
                        return Err(OrchestratorError::validation(format!(
                            "'{}' and '{}' hold {} parts together; at most {} can be reordered",
                            lead.map(|i| pools[i].name.as_str()).unwrap_or("skills"),
                            pools[tail].name,
                            skills.len() + goals.len(),
                            MAX_PERMUTABLE_PARTS
                        )));
                    }
                    slots.push(Slot {
                        name: pools[tail].name.clone(),
                        segment: Segment::Tailed {
                            free: skills.to_vec(),
                            tail: goals.clone(),
                        },
                    });
                }
                SlotRole::Free => {
                    let parts = pool.active_parts();
                    if parts.is_empty() {
                        continue;
                    }
                    if parts.len() > MAX_PERMUTABLE_PARTS {
                        return Err(OrchestratorError::validation(format!(
                            "'{}' holds {} parts; at most {} can be reordered",
                            pool.name,
                            parts.len(),
                            MAX_PERMUTABLE_PARTS
                        )));
                    }
                    slots.push(Slot {
                        name: pool.name.clone(),
                        segment: Segment::Ordered(parts.to_vec()),
                    });
                }
                SlotRole::FixedPosition => {
                    if !pool.enabled {
                        continue;
                    }
                    slots.push(Slot {
                        name: pool.name.clone(),
                        segment: Segment::Single(pool.parts.clone()),
                    });
                }
            }
        }

        Ok(Self { slots })
    }

    /// Number of combinations in the space
    pub fn len(&self) -> u128 {
        self.slots
            .iter()
            .fold(1u128, |acc, slot| acc.saturating_mul(slot.segment.options()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the first slot that has no valid option, if any
    pub fn blocking_slot(&self) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| slot.segment.options() == 0)
            .map(|slot| slot.name.as_str())
    }

    /// Decode the combination at `index`, `None` past the end
    pub fn combination_at(&self, index: u128) -> Option<Combination> {
        if index >= self.len() {
            return None;
        }

        let mut digits = vec![0u128; self.slots.len()];
        let mut remainder = index;
        for (slot, digit) in self.slots.iter().zip(digits.iter_mut()).rev() {
            let radix = slot.segment.options();
            *digit = remainder % radix;
            remainder /= radix;
        }

        let mut combination = Vec::new();
        for (slot, digit) in self.slots.iter().zip(digits) {
            slot.segment.decode_into(digit, &mut combination);
        }
        Some(combination)
    }
}

/// Every versus combination in index order
pub fn enumerate_all_versus_combinations(pools: &[PartPool]) -> OrchestratorResult<Vec<Combination>> {
    let space = VersusSpace::build(pools)?;
    let total = space.len();
    Ok((0..total).filter_map(|index| space.combination_at(index)).collect())
}

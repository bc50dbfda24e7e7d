//! Smart sampler for independent pools too large to enumerate
//!
//! Draws distinct combinations (one part per pool) with an early round-robin
//! phase on the perceptually important pools so the first outputs already
//! differ where viewers look first, and uniform random picks elsewhere.

use rand::Rng;
use shared::{Combination, MediaPart};

use crate::core::counting::count_independent;
use crate::core::keys::CombinationKeyStore;

/// Attempts allowed per requested combination
pub const ATTEMPTS_PER_TARGET: usize = 100;

/// How many pools (by priority order) get the round-robin treatment
pub const PRIORITY_SET_SIZE: usize = 3;

/// Pool indices in variation priority: first, the last two, then the rest
pub fn priority_order(pool_count: usize) -> Vec<usize> {
    let mut order = Vec::with_capacity(pool_count);
    let mut push = |index: usize| {
        if index < pool_count && !order.contains(&index) {
            order.push(index);
        }
    };

    push(0);
    if pool_count >= 2 {
        push(pool_count - 2);
        push(pool_count - 1);
    }
    for index in 0..pool_count {
        push(index);
    }
    order
}

/// Distinct-combination sampler over independent pools
#[derive(Debug)]
pub struct SmartSampler {
    /// Round-robin rank per pool, `None` outside the priority set
    ranks: Vec<Option<usize>>,
    keys: CombinationKeyStore,
}

impl SmartSampler {
    pub fn new(pool_count: usize) -> Self {
        let mut ranks = vec![None; pool_count];
        for (rank, index) in priority_order(pool_count).into_iter().enumerate() {
            if rank < PRIORITY_SET_SIZE {
                ranks[index] = Some(rank);
            }
        }
        Self {
            ranks,
            keys: CombinationKeyStore::new(),
        }
    }

    /// Draw up to `requested` distinct combinations
    ///
    /// Returns `min(requested, product of pool sizes)` rows unless the
    /// attempt budget runs out first, in which case fewer rows come back.
    pub fn sample<R: Rng>(&mut self, pools: &[Vec<MediaPart>], requested: usize, rng: &mut R) -> Vec<Combination> {
        let max_possible = count_independent(pools);
        let target = (requested as u128).min(max_possible) as usize;
        if target == 0 {
            return Vec::new();
        }

        let budget = target.saturating_mul(ATTEMPTS_PER_TARGET);
        let mut results: Vec<Combination> = Vec::with_capacity(target);
        let mut attempts = 0;
        // Round-robin is deterministic, so a slot that collided once retries at random
        let mut retrying = false;

        while results.len() < target && attempts < budget {
            attempts += 1;
            let produced = results.len();

            let candidate: Combination = pools
                .iter()
                .enumerate()
                .map(|(index, pool)| {
                    let round_robin = match self.ranks.get(index).copied().flatten() {
                        Some(rank) if !retrying && produced < 2 * pool.len() => Some(rank),
                        _ => None,
                    };
                    let pick = match round_robin {
                        Some(rank) => (produced + rank) % pool.len(),
                        None => rng.gen_range(0..pool.len()),
                    };
                    pool[pick].clone()
                })
                .collect();

            if self.keys.insert(&candidate) {
                results.push(candidate);
                retrying = false;
            } else {
                retrying = true;
            }
        }

        results
    }
}

//! Core business logic modules
//!
//! Pure combinatorics, selection and state with no I/O dependencies.
//! Randomised functions take an `Rng` so callers control seeding.

pub mod counting;
pub mod keys;
pub mod permutation;
pub mod planner;
pub mod progress;
pub mod randomizer;
pub mod sampler;
pub mod state;
pub mod versus;

pub use counting::{count_combinations, count_independent, pair_contribution};
pub use keys::{combination_key, CombinationKeyStore};
pub use permutation::{factorial, interleave_with_mandatory_tail, nth_permutation, permute};
pub use planner::{inputs_fingerprint, plan, validate, JobPlan, PlannedItem, SpaceSize, ValidatedRequest};
pub use progress::ProgressTracker;
pub use randomizer::{pick_hook, pick_hook_index_at, pick_timing, TimingParams};
pub use sampler::SmartSampler;
pub use state::{GenerationJob, GenerationPhase, GenerationSession};
pub use versus::{enumerate_all_versus_combinations, VersusSpace};

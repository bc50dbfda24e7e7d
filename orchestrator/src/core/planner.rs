//! Job planning
//!
//! Turns a validated generation request into the ordered list of items the
//! run loop walks. Every random choice made here comes from a `StdRng`
//! seeded with the plan seed, so a resumed run rebuilds the exact same list
//! from the seed stored in its checkpoint.

use std::collections::HashSet;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use shared::{AudioSelection, Combination, GenerationMode, GenerationRequest, MediaKind, MediaPart, SlotRole};

use crate::core::counting::count_independent;
use crate::core::sampler::SmartSampler;
use crate::core::versus::VersusSpace;
use crate::error::{OrchestratorError, OrchestratorResult};

/// Above this many candidates, distinct indices are drawn by rejection
const INDEX_SAMPLE_LIMIT: u128 = 1_000_000;

/// Size of the combination space for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceSize {
    Finite(u128),
    /// Reshuffled modes never run out of variants
    Unbounded,
}

impl SpaceSize {
    pub fn is_empty(&self) -> bool {
        matches!(self, SpaceSize::Finite(0))
    }

    /// How many items can actually be produced for `requested`
    pub fn clamp(&self, requested: usize) -> usize {
        match self {
            SpaceSize::Finite(size) => (requested as u128).min(*size) as usize,
            SpaceSize::Unbounded => requested,
        }
    }
}

impl fmt::Display for SpaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceSize::Finite(size) => write!(f, "{size}"),
            SpaceSize::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// One item of a plan
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedItem {
    pub index: usize,
    pub combination: Combination,
    /// Hook line pinned by the mode (add-hook), otherwise picked per item
    pub fixed_hook: Option<usize>,
    pub outer: usize,
    pub inner: usize,
}

/// The full, ordered job list of a run
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub mode: GenerationMode,
    pub items: Vec<PlannedItem>,
    pub space: SpaceSize,
    pub requested: usize,
    pub seed: u64,
    pub hook_lines: Vec<String>,
}

impl JobPlan {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Fewer items than requested will be generated
    pub fn is_clamped(&self) -> bool {
        self.items.len() < self.requested
    }

    pub fn item(&self, index: usize) -> Option<&PlannedItem> {
        self.items.get(index)
    }

    /// Outer / inner position of a flat index, `(total, 0)` past the end
    pub fn position_of(&self, index: usize) -> (usize, usize) {
        self.items
            .get(index)
            .map(|item| (item.outer, item.inner))
            .unwrap_or((self.items.len(), 0))
    }
}

/// A request that passed validation, with its combination space built once
#[derive(Debug)]
pub struct ValidatedRequest<'a> {
    request: &'a GenerationRequest,
    layout: Layout,
    space: SpaceSize,
}

/// Mode-specific material the plan is drawn from
#[derive(Debug)]
enum Layout {
    Versus(VersusSpace),
    Fixed(Vec<Vec<MediaPart>>),
    Shuffled(Vec<MediaPart>),
    Hooked(Vec<MediaPart>),
}

/// Precondition checks shared by every mode, then the mode-specific ones
pub fn validate(request: &GenerationRequest) -> OrchestratorResult<ValidatedRequest<'_>> {
    let settings = &request.settings;
    if settings.requested_count == 0 {
        return Err(OrchestratorError::validation("at least one video must be requested"));
    }
    if request.audio.is_none() {
        return Err(OrchestratorError::validation(
            "select a music track or explicitly choose no music",
        ));
    }
    if request.hook_lines().is_empty() {
        return Err(OrchestratorError::validation("add at least one non-empty hook line"));
    }
    if !settings.timing.is_valid() {
        return Err(OrchestratorError::validation(format!(
            "timing range {}..{}ms is invalid",
            settings.timing.min_ms, settings.timing.max_ms
        )));
    }
    if let Some(range) = settings.item_count {
        if range.min > range.max {
            return Err(OrchestratorError::validation(format!(
                "item count range {}..{} is invalid",
                range.min, range.max
            )));
        }
    }

    let layout = match request.mode {
        GenerationMode::Versus => {
            let space = VersusSpace::build(&request.pools)?;
            if space.is_empty() {
                let slot = space.blocking_slot().unwrap_or("a required slot");
                return Err(OrchestratorError::validation(format!(
                    "no valid combination: '{slot}' needs at least one clip"
                )));
            }
            Layout::Versus(space)
        }
        GenerationMode::Fein | GenerationMode::Creed => Layout::Fixed(fixed_pools(request)?),
        GenerationMode::Autocut => {
            let clips = media_of_kind(request, MediaKind::Video);
            if clips.is_empty() {
                return Err(OrchestratorError::validation("autocut needs at least one clip"));
            }
            match &request.audio {
                Some(AudioSelection::Track { words, .. }) if !words.is_empty() => {}
                _ => {
                    return Err(OrchestratorError::validation(
                        "autocut needs a track with word-level lyric timings",
                    ))
                }
            }
            Layout::Shuffled(clips)
        }
        GenerationMode::Slideshow => {
            let images = media_of_kind(request, MediaKind::Image);
            if images.is_empty() {
                return Err(OrchestratorError::validation("slideshow needs at least one image"));
            }
            Layout::Shuffled(images)
        }
        GenerationMode::AddHook => {
            let videos = all_media(request);
            if videos.is_empty() {
                return Err(OrchestratorError::validation("add-hook needs at least one base video"));
            }
            Layout::Hooked(videos)
        }
    };

    let space = match &layout {
        Layout::Versus(space) => SpaceSize::Finite(space.len()),
        Layout::Fixed(pools) => SpaceSize::Finite(count_independent(pools)),
        Layout::Shuffled(_) => SpaceSize::Unbounded,
        Layout::Hooked(videos) => {
            let hooks = request.hook_lines().len() as u128;
            SpaceSize::Finite(hooks.saturating_mul(videos.len() as u128))
        }
    };

    Ok(ValidatedRequest { request, layout, space })
}

/// Validate, size and materialise the job list
pub fn plan(request: &GenerationRequest, seed: u64) -> OrchestratorResult<JobPlan> {
    validate(request)?.plan(seed)
}

impl ValidatedRequest<'_> {
    /// Exact or unbounded size of the combination space
    pub fn space(&self) -> SpaceSize {
        self.space
    }

    /// Materialise the job list for `seed`
    pub fn plan(&self, seed: u64) -> OrchestratorResult<JobPlan> {
        if self.space.is_empty() {
            return Err(OrchestratorError::validation("the combination space is empty"));
        }

        let requested = self.request.settings.requested_count;
        let target = self.space.clamp(requested);
        let mut rng = StdRng::seed_from_u64(seed);

        let items = match &self.layout {
            Layout::Versus(versus) => select_indices(versus.len(), target, &mut rng)
                .into_iter()
                .filter_map(|index| versus.combination_at(index))
                .enumerate()
                .map(|(i, combination)| sequential(i, combination))
                .collect(),
            Layout::Fixed(pools) => SmartSampler::new(pools.len())
                .sample(pools, target, &mut rng)
                .into_iter()
                .enumerate()
                .map(|(i, combination)| sequential(i, combination))
                .collect(),
            Layout::Shuffled(media) => reshuffled(media, target, &mut rng),
            Layout::Hooked(videos) => (0..target)
                .map(|i| {
                    let outer = i / videos.len();
                    let inner = i % videos.len();
                    PlannedItem {
                        index: i,
                        combination: vec![videos[inner].clone()],
                        fixed_hook: Some(outer),
                        outer,
                        inner,
                    }
                })
                .collect(),
        };

        Ok(JobPlan {
            mode: self.request.mode,
            items,
            space: self.space,
            requested,
            seed,
            hook_lines: self.request.hook_lines(),
        })
    }
}

/// Fingerprint of everything a resumed run must find unchanged
pub fn inputs_fingerprint(request: &GenerationRequest) -> String {
    let mut hasher = Sha256::new();
    hasher.update(request.mode.to_string().as_bytes());
    for pool in &request.pools {
        hasher.update(b"\x1epool:");
        hasher.update(pool.name.as_bytes());
        hasher.update(if pool.enabled { b"+" } else { b"-" });
        for part in &pool.parts {
            hasher.update(b"\x1f");
            hasher.update(part.id.as_bytes());
        }
    }
    for hook in request.hook_lines() {
        hasher.update(b"\x1ehook:");
        hasher.update(hook.as_bytes());
    }
    hasher.update(request.settings.requested_count.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// `n` distinct indices out of `0..total`, all of them when `n >= total`
pub fn select_indices<R: Rng>(total: u128, n: usize, rng: &mut R) -> Vec<u128> {
    if n as u128 >= total {
        return (0..total).collect();
    }
    if total <= INDEX_SAMPLE_LIMIT {
        return rand::seq::index::sample(rng, total as usize, n)
            .into_iter()
            .map(|index| index as u128)
            .collect();
    }

    let mut seen = HashSet::with_capacity(n);
    let mut picked = Vec::with_capacity(n);
    while picked.len() < n {
        let index = rng.gen_range(0..total);
        if seen.insert(index) {
            picked.push(index);
        }
    }
    picked
}

fn sequential(index: usize, combination: Combination) -> PlannedItem {
    PlannedItem {
        index,
        combination,
        fixed_hook: None,
        outer: index,
        inner: 0,
    }
}

fn reshuffled<R: Rng>(media: &[MediaPart], target: usize, rng: &mut R) -> Vec<PlannedItem> {
    (0..target)
        .map(|i| {
            let mut combination = media.to_vec();
            combination.shuffle(rng);
            sequential(i, combination)
        })
        .collect()
}

fn fixed_pools(request: &GenerationRequest) -> OrchestratorResult<Vec<Vec<MediaPart>>> {
    let expected = request.mode.fixed_pool_count().unwrap_or(request.pools.len());
    let fixed: Vec<_> = request
        .pools
        .iter()
        .filter(|pool| pool.role == SlotRole::FixedPosition)
        .collect();

    if fixed.len() != expected || request.pools.len() != expected {
        return Err(OrchestratorError::validation(format!(
            "{} needs exactly {} fixed-position parts, got {}",
            request.mode,
            expected,
            fixed.len()
        )));
    }
    if let Some(empty) = fixed.iter().find(|pool| pool.enabled && pool.is_empty()) {
        return Err(OrchestratorError::validation(format!(
            "'{}' is empty; every enabled part needs at least one clip",
            empty.name
        )));
    }

    // Disabled parts are left out of the sequence
    Ok(fixed
        .into_iter()
        .filter(|pool| pool.enabled)
        .map(|pool| pool.parts.clone())
        .collect())
}

fn all_media(request: &GenerationRequest) -> Vec<MediaPart> {
    request
        .pools
        .iter()
        .flat_map(|pool| pool.active_parts().iter().cloned())
        .collect()
}

fn media_of_kind(request: &GenerationRequest, kind: MediaKind) -> Vec<MediaPart> {
    all_media(request).into_iter().filter(|part| part.kind == kind).collect()
}

//! Hook and timing selection
//!
//! Spreads hook lines and timing values across a batch so consecutive
//! outputs do not look alike. Selection mixes in wall-clock time: it is
//! neither cryptographic nor reproducible across runs.

use chrono::Utc;
use rand::Rng;
use shared::VariantSettings;

/// Large odd multiplier that keeps nearby batch indices apart
pub const HOOK_SEED_MULTIPLIER: f64 = 7919.0;

/// Maximum deviation from the linear timing ramp, as a ratio
pub const TIMING_CHAOS: f64 = 0.6;

/// Independent jitter added to every timing value, in ms
pub const MICRO_JITTER_MS: f64 = 25.0;

/// Timing knobs chosen for one batch item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingParams {
    pub timing_ms: u64,
    pub item_count: Option<u32>,
}

/// Hook index for a batch item from an explicit clock reading
pub fn pick_hook_index_at<R: Rng>(hook_count: usize, batch_index: usize, now_ms: i64, rng: &mut R) -> Option<usize> {
    if hook_count == 0 {
        return None;
    }

    let seed = now_ms as f64 + batch_index as f64 * HOOK_SEED_MULTIPLIER + rng.r#gen::<f64>() * 10_000.0;
    let value = (seed * 0.001).sin() * 10_000.0;
    Some((value.abs() as u64 % hook_count as u64) as usize)
}

/// Hook line for a batch item
pub fn pick_hook<'a, R: Rng>(hook_lines: &'a [String], batch_index: usize, rng: &mut R) -> Option<&'a str> {
    pick_hook_index_at(hook_lines.len(), batch_index, Utc::now().timestamp_millis(), rng)
        .map(|index| hook_lines[index].as_str())
}

/// Timing for a batch item
///
/// With variation on, items ramp from the minimum to the maximum of the
/// configured range over the batch, perturbed by up to ±30% and a small
/// independent jitter. With variation off, always the midpoint.
pub fn pick_timing<R: Rng>(batch_index: usize, total_count: usize, settings: &VariantSettings, rng: &mut R) -> TimingParams {
    let timing = settings.timing;

    if !settings.variation_enabled {
        return TimingParams {
            timing_ms: timing.midpoint(),
            item_count: settings.item_count.map(|range| range.midpoint()),
        };
    }

    let ratio = if total_count <= 1 {
        0.5
    } else {
        batch_index as f64 / (total_count - 1) as f64
    };
    let chaos = (rng.r#gen::<f64>() - 0.5) * TIMING_CHAOS;
    let final_ratio = (ratio + chaos).clamp(0.0, 1.0);

    let span = timing.max_ms.saturating_sub(timing.min_ms) as f64;
    let jitter = rng.gen_range(-MICRO_JITTER_MS..=MICRO_JITTER_MS);
    let timing_ms = (timing.min_ms as f64 + span * final_ratio + jitter).round().max(0.0) as u64;

    let item_count = settings.item_count.map(|range| {
        let span = range.max.saturating_sub(range.min) as f64;
        (range.min as f64 + span * final_ratio).round() as u32
    });

    TimingParams { timing_ms, item_count }
}

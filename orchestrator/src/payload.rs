//! Render payload construction
//!
//! Everything run-wide (audio, branding, styling) is resolved once into a
//! `PayloadContext`; each job then only contributes its own part URLs, hook
//! line and timing.

use shared::{AudioTrack, GenerationMode, HookStyle, RenderRequest};

use crate::core::GenerationJob;

/// Run-wide payload inputs, resolved during setup
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadContext {
    pub mode: GenerationMode,
    pub hook_style: HookStyle,
    pub variation: bool,
    pub audio: AudioTrack,
    pub branding_url: Option<String>,
}

impl PayloadContext {
    /// Audio as the given mode expects it; lyric timings only travel with autocut
    fn audio_for_mode(&self) -> AudioTrack {
        match (&self.audio, self.mode) {
            (AudioTrack::Track { url, start_ms, .. }, mode) if mode != GenerationMode::Autocut => AudioTrack::Track {
                url: url.clone(),
                start_ms: *start_ms,
                words: Vec::new(),
            },
            (audio, _) => audio.clone(),
        }
    }
}

/// Job payload for one item
pub fn build_payload(context: &PayloadContext, job: &GenerationJob, part_urls: Vec<String>) -> RenderRequest {
    // Cut/image counts only mean something for the reshuffled modes
    let item_count = match context.mode {
        GenerationMode::Autocut | GenerationMode::Slideshow => job.timing.item_count,
        _ => None,
    };

    RenderRequest {
        mode: context.mode,
        index: job.index,
        part_urls,
        hook_text: job.hook_text.clone(),
        hook_style: context.hook_style.clone(),
        audio: context.audio_for_mode(),
        timing_ms: job.timing.timing_ms,
        item_count,
        variation: context.variation,
        branding_url: context.branding_url.clone(),
    }
}

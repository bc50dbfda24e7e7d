//! Service-specific tests
//!
//! Each service has its own test file. HTTP clients run against a local
//! wiremock server, the checkpoint store against a temp directory.


// Common test utilities for services
#[cfg(test)]
pub mod common {
    use shared::{AudioTrack, GenerationMode, HookStyle, RenderRequest};

    /// Minimal render job for a mode
    pub fn render_request(mode: GenerationMode, index: usize) -> RenderRequest {
        RenderRequest {
            mode,
            index,
            part_urls: vec![format!("https://cdn.test/part-{index}.mp4")],
            hook_text: Some("wait for it".to_string()),
            hook_style: HookStyle::default(),
            audio: AudioTrack::NoMusic,
            timing_ms: 2000,
            item_count: None,
            variation: true,
            branding_url: None,
        }
    }
}

//! Render and upload service bodies

use serde::{Deserialize, Serialize};

use crate::messages::config::WordTiming;
use crate::types::GenerationMode;

/// Overlay placement forwarded untouched to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookStyle {
    pub position: String,
    pub offset_y: i32,
    pub font_size: u32,
}

impl Default for HookStyle {
    fn default() -> Self {
        Self {
            position: "center".to_string(),
            offset_y: 0,
            font_size: 64,
        }
    }
}

/// Resolved audio reference sent with a render job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AudioTrack {
    Track {
        url: String,
        #[serde(rename = "startMs")]
        start_ms: u64,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        words: Vec<WordTiming>,
    },
    /// Explicit "no music" sentinel
    NoMusic,
}

/// Job description posted to a render endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub mode: GenerationMode,
    pub index: usize,
    pub part_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_text: Option<String>,
    pub hook_style: HookStyle,
    pub audio: AudioTrack,
    pub timing_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u32>,
    pub variation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding_url: Option<String>,
}

/// Render endpoint reply, either a single video or a media list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RenderResponse {
    pub fn video(path: impl Into<String>) -> Self {
        Self {
            video_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Every media reference carried by a successful reply, in order
    pub fn media_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.video_path.iter().cloned().collect();
        urls.extend(self.media.iter().cloned());
        urls
    }

    /// Server supplied error text, if any
    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

/// Upload endpoint reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

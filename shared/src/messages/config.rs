//! Generation request and per-mode configuration
//!
//! This is the shape of a job file handed to the CLI and of the state the UI
//! collects before a run starts.

use serde::{Deserialize, Serialize};

use crate::messages::render::HookStyle;
use crate::types::{GenerationMode, MediaPart, PartPool};

/// Inclusive millisecond range used for timing variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl TimingRange {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn midpoint(&self) -> u64 {
        self.min_ms + self.max_ms.saturating_sub(self.min_ms) / 2
    }

    pub fn is_valid(&self) -> bool {
        self.min_ms <= self.max_ms
    }
}

impl Default for TimingRange {
    fn default() -> Self {
        Self {
            min_ms: 1500,
            max_ms: 3000,
        }
    }
}

/// Inclusive range for the number of cuts / images per output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub fn midpoint(&self) -> u32 {
        self.min + self.max.saturating_sub(self.min) / 2
    }
}

/// Word-level timing from the lyrics extraction service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordTiming {
    pub word: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Background music choice; generation requires one of the two explicitly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AudioSelection {
    Track {
        track: MediaPart,
        #[serde(default, rename = "startMs")]
        start_ms: u64,
        #[serde(default)]
        words: Vec<WordTiming>,
    },
    NoMusic,
}

impl AudioSelection {
    pub fn words(&self) -> &[WordTiming] {
        match self {
            AudioSelection::Track { words, .. } => words,
            AudioSelection::NoMusic => &[],
        }
    }
}

fn default_true() -> bool {
    true
}

/// Per-mode knobs chosen by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSettings {
    pub requested_count: usize,
    #[serde(default)]
    pub timing: TimingRange,
    #[serde(default)]
    pub item_count: Option<CountRange>,
    #[serde(default = "default_true")]
    pub variation_enabled: bool,
    #[serde(default)]
    pub hook_style: HookStyle,
    #[serde(default)]
    pub branding: Option<MediaPart>,
}

impl VariantSettings {
    pub fn with_count(requested_count: usize) -> Self {
        Self {
            requested_count,
            timing: TimingRange::default(),
            item_count: None,
            variation_enabled: true,
            hook_style: HookStyle::default(),
            branding: None,
        }
    }
}

/// Everything needed to plan and run one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    #[serde(default)]
    pub pools: Vec<PartPool>,
    #[serde(default)]
    pub hooks: Vec<String>,
    #[serde(default)]
    pub audio: Option<AudioSelection>,
    pub settings: VariantSettings,
}

impl GenerationRequest {
    /// Hook lines with surrounding whitespace removed, blank lines dropped
    pub fn hook_lines(&self) -> Vec<String> {
        self.hooks
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

//! Persisted resume state
//!
//! One record per user, overwritten on every save and removed on normal
//! completion or explicit discard. The first seven fields are the stable
//! format; everything after them is optional on read so older records load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::types::GenerationMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointRecord {
    pub is_generating: bool,
    /// Percentage in 0..=100
    pub progress: f64,
    #[serde(default)]
    pub generated_videos: Vec<String>,
    pub generated_count: usize,
    pub total_to_generate: usize,
    pub current_hook_index: usize,
    pub current_media_index: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<GenerationMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_index: Option<usize>,
    #[serde(default)]
    pub failed_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl CheckpointRecord {
    /// Reduced record used when the full one cannot be stored
    pub fn minimal(&self) -> Self {
        Self {
            generated_videos: Vec::new(),
            saved_at: None,
            ..self.clone()
        }
    }

    pub fn to_json(&self) -> SharedResult<String> {
        serde_json::to_string(self).map_err(|e| SharedError::SerializationError {
            message: e.to_string(),
        })
    }

    pub fn from_json(raw: &str) -> SharedResult<Self> {
        serde_json::from_str(raw).map_err(|e| SharedError::DeserializationError {
            message: e.to_string(),
        })
    }
}

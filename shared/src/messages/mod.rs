//! Wire formats for the variant generation engine
//!
//! This module organizes the serialized messages by category:
//! - `config`: Generation request and per-mode knobs (job file / UI input)
//! - `render`: Render and upload service request/response bodies
//! - `checkpoint`: Persisted resume state
//! - `progress`: User facing progress and notification signals

pub mod checkpoint;
pub mod config;
pub mod progress;
pub mod render;

pub use checkpoint::CheckpointRecord;

pub use config::{
    AudioSelection, CountRange, GenerationRequest, TimingRange, VariantSettings, WordTiming,
};

pub use progress::{ProgressUpdate, ToastLevel};

pub use render::{AudioTrack, HookStyle, RenderRequest, RenderResponse, UploadResponse};

//! Shared types for the variant generation engine
//!
//! Contains the data model, the wire formats exchanged with the render and
//! upload services, the persisted checkpoint format and the logging setup.
//! Engine-internal types (planner state, progress tracking) live in the
//! orchestrator crate.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

// Re-export the wire formats
pub use messages::{
    // Persisted resume state
    CheckpointRecord,

    // Render / upload service bodies
    AudioTrack, HookStyle, RenderRequest, RenderResponse, UploadResponse,

    // Generation request and per-mode knobs
    AudioSelection, CountRange, GenerationRequest, TimingRange, VariantSettings, WordTiming,

    // User facing signals
    ProgressUpdate, ToastLevel,
};

//! Orchestrator library for batch generation of short-video variants
//!
//! Plans distinct part combinations for a generation request, submits one
//! render job per variant in order, tracks progress and keeps a checkpoint
//! so an interrupted batch can be resumed where it stopped.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod payload;
pub mod persistence;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{ConfigOverrides, EngineConfig};
pub use core::{GenerationPhase, GenerationSession, JobPlan, SpaceSize};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{CancelHandle, Orchestrator, RunOutcome, RunSummary, SessionHandle};
pub use persistence::{CheckpointManager, SaveOutcome};
pub use traits::{AssetUploader, CheckpointStore, Notifier, RenderApi, ResumeChoice, ResumeOffer};

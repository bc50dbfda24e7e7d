//! Trait definitions with mockall annotations for testing
//!
//! The orchestrator only talks to the outside world through these seams:
//! the render API, the asset upload API, durable checkpoint storage and the
//! user (progress, notifications and the resume prompt). Real implementations
//! live in `services`, tests use the generated mocks.

use std::path::PathBuf;

use shared::{CheckpointRecord, GenerationMode, MediaKind, ProgressUpdate, RenderRequest, RenderResponse, ToastLevel};

use crate::error::OrchestratorResult;

/// Summary shown when an interrupted run is found on start-up
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeOffer {
    pub mode: Option<GenerationMode>,
    pub generated_count: usize,
    pub total_to_generate: usize,
    pub progress: f64,
}

/// The user's answer to a resume offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeChoice {
    Resume,
    Discard,
}

/// Render backend abstraction
///
/// One endpoint per mode; a non-success reply is reported as
/// `OrchestratorError::RenderRequest` carrying the server's error text.
#[mockall::automock]
#[async_trait::async_trait]
pub trait RenderApi: Send + Sync {
    /// Submit one job and wait for the rendered media reference
    async fn render(&self, mode: GenerationMode, request: RenderRequest) -> OrchestratorResult<RenderResponse>;
}

/// Asset upload abstraction
#[mockall::automock]
#[async_trait::async_trait]
pub trait AssetUploader: Send + Sync {
    /// Upload a local file and return its durable URL
    ///
    /// # Parameters
    /// - `path`: Local file to upload
    /// - `kind`: Resource-type hint for the storage service
    async fn upload(&self, path: PathBuf, kind: MediaKind) -> OrchestratorResult<String>;
}

/// Durable checkpoint storage, one record per user
#[mockall::automock]
#[async_trait::async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Overwrite the stored record
    async fn save(&self, record: CheckpointRecord) -> OrchestratorResult<()>;

    /// Read the stored record, `None` when nothing is stored
    async fn load(&self) -> OrchestratorResult<Option<CheckpointRecord>>;

    /// Remove the stored record entirely
    async fn clear(&self) -> OrchestratorResult<()>;
}

/// User facing feedback
#[mockall::automock]
pub trait Notifier: Send + Sync {
    /// Progress bar and "processing item X of Y" line
    fn progress(&self, update: ProgressUpdate);

    /// Transient, non-modal notification
    fn toast(&self, level: ToastLevel, message: String);

    /// Blocking notification that needs acknowledgement
    fn modal(&self, message: String);

    /// Ask whether an interrupted run should be resumed
    fn confirm_resume(&self, offer: ResumeOffer) -> ResumeChoice;
}

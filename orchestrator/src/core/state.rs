//! Generation session state
//!
//! Pure state for one batch run: the resumable session record, the per-item
//! job and the orchestrator phase. No I/O happens here.

use std::fmt;

use chrono::Utc;
use shared::{CheckpointRecord, Combination, GenerationMode, JobStatus};

use crate::core::randomizer::TimingParams;

/// Orchestrator state machine phase
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPhase {
    Idle,
    Validating,
    Enumerating,
    Running { index: usize },
    Completed,
    Cancelled,
    FatalError(String),
}

impl GenerationPhase {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            GenerationPhase::Validating | GenerationPhase::Enumerating | GenerationPhase::Running { .. }
        )
    }
}

impl fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationPhase::Idle => write!(f, "idle"),
            GenerationPhase::Validating => write!(f, "validating"),
            GenerationPhase::Enumerating => write!(f, "enumerating"),
            GenerationPhase::Running { index } => write!(f, "running({index})"),
            GenerationPhase::Completed => write!(f, "completed"),
            GenerationPhase::Cancelled => write!(f, "cancelled"),
            GenerationPhase::FatalError(reason) => write!(f, "fatal: {reason}"),
        }
    }
}

/// One unit of orchestrated work
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub index: usize,
    pub combination: Combination,
    pub hook_text: Option<String>,
    pub timing: TimingParams,
    pub status: JobStatus,
}

impl GenerationJob {
    pub fn new(index: usize, combination: Combination, hook_text: Option<String>, timing: TimingParams) -> Self {
        Self {
            index,
            combination,
            hook_text,
            timing,
            status: JobStatus::Pending,
        }
    }

    pub fn begin(&mut self) {
        self.status = JobStatus::InFlight;
    }

    pub fn succeed(&mut self) {
        self.status = JobStatus::Done;
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = JobStatus::Failed(reason.into());
    }
}

/// The resumable checkpoint of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSession {
    pub is_generating: bool,
    pub total_to_generate: usize,
    pub generated_count: usize,
    pub failed_count: usize,
    pub completed_media_urls: Vec<String>,
    /// Outer / inner position of the next item to process
    pub current_outer_index: usize,
    pub current_inner_index: usize,
    /// Flat index of the next item to process
    pub next_index: usize,
    pub progress_percent: f64,
    pub mode: Option<GenerationMode>,
    pub plan_seed: Option<u64>,
    pub inputs_fingerprint: Option<String>,
}

impl GenerationSession {
    /// Fresh session for a planned run
    pub fn start(mode: GenerationMode, total: usize, plan_seed: u64, fingerprint: String) -> Self {
        Self {
            is_generating: true,
            total_to_generate: total,
            mode: Some(mode),
            plan_seed: Some(plan_seed),
            inputs_fingerprint: Some(fingerprint),
            ..Default::default()
        }
    }

    /// Point the session at the next item to process
    pub fn advance_to(&mut self, next_index: usize, outer: usize, inner: usize) {
        self.next_index = next_index;
        self.current_outer_index = outer;
        self.current_inner_index = inner;
    }

    pub fn record_success(&mut self, media_urls: Vec<String>) {
        self.generated_count += 1;
        self.completed_media_urls.extend(media_urls);
    }

    pub fn record_failure(&mut self) {
        self.failed_count += 1;
    }

    /// Items that reached a terminal state
    pub fn processed(&self) -> usize {
        self.next_index
    }

    pub fn is_resumable(&self) -> bool {
        self.is_generating && self.generated_count < self.total_to_generate
    }

    /// Zero every counter, dropping the results
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_record(&self) -> CheckpointRecord {
        CheckpointRecord {
            is_generating: self.is_generating,
            progress: self.progress_percent,
            generated_videos: self.completed_media_urls.clone(),
            generated_count: self.generated_count,
            total_to_generate: self.total_to_generate,
            current_hook_index: self.current_outer_index,
            current_media_index: self.current_inner_index,
            mode: self.mode,
            plan_seed: self.plan_seed,
            inputs_fingerprint: self.inputs_fingerprint.clone(),
            next_index: Some(self.next_index),
            failed_count: self.failed_count,
            saved_at: Some(Utc::now()),
        }
    }

    pub fn from_record(record: &CheckpointRecord) -> Self {
        Self {
            is_generating: record.is_generating,
            total_to_generate: record.total_to_generate,
            generated_count: record.generated_count,
            failed_count: record.failed_count,
            completed_media_urls: record.generated_videos.clone(),
            current_outer_index: record.current_hook_index,
            current_inner_index: record.current_media_index,
            next_index: record.next_index.unwrap_or(record.current_hook_index),
            progress_percent: record.progress,
            mode: record.mode,
            plan_seed: record.plan_seed,
            inputs_fingerprint: record.inputs_fingerprint.clone(),
        }
    }
}

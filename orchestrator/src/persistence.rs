//! Checkpoint persistence with graceful degradation
//!
//! A failed write falls back to a minimal record once; if that fails too,
//! checkpoints are switched off for the rest of the run. Persistence errors
//! never reach the caller as failures.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::core::GenerationSession;
use crate::error::OrchestratorResult;
use crate::traits::CheckpointStore;

/// What a save actually managed to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Only the minimal record fit; generated URLs were dropped
    Degraded,
    /// Nothing written; resume is no longer possible for this run
    Disabled,
}

pub struct CheckpointManager<S: CheckpointStore> {
    store: S,
    disabled: AtomicBool,
}

impl<S: CheckpointStore> CheckpointManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            disabled: AtomicBool::new(false),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Re-arm checkpoints for a new run
    pub fn reset(&self) {
        self.disabled.store(false, Ordering::SeqCst);
    }

    pub async fn save_checkpoint(&self, session: &GenerationSession) -> SaveOutcome {
        if self.is_disabled() {
            return SaveOutcome::Disabled;
        }

        let record = session.to_record();
        let full_error = match self.store.save(record.clone()).await {
            Ok(()) => return SaveOutcome::Saved,
            Err(e) => e,
        };
        debug!("Full checkpoint rejected ({}), retrying with minimal record", full_error);

        match self.store.save(record.minimal()).await {
            Ok(()) => SaveOutcome::Degraded,
            Err(e) => {
                warn!("⚠️ Checkpoints disabled for this run: {}", e);
                self.disabled.store(true, Ordering::SeqCst);
                SaveOutcome::Disabled
            }
        }
    }

    /// Stored session, if any record exists
    pub async fn load_checkpoint(&self) -> OrchestratorResult<Option<GenerationSession>> {
        let record = self.store.load().await?;
        Ok(record.as_ref().map(GenerationSession::from_record))
    }

    pub async fn clear_checkpoint(&self) -> OrchestratorResult<()> {
        self.store.clear().await
    }
}

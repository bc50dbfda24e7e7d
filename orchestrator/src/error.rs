//! Orchestrator-specific error types

use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Could not resolve {resource}: {reason}")]
    ResourceResolution { resource: String, reason: String },

    #[error("Render request failed (status {status}): {message}")]
    RenderRequest { status: u16, message: String },

    #[error("Checkpoint could not be written: {reason}")]
    Persistence { reason: String },

    #[error("Cannot resume: {reason}")]
    ResumeIntegrity { reason: String },

    #[error("Configuration error: {field}")]
    Configuration { field: String },

    #[error("Generation aborted: {reason}")]
    Fatal { reason: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl OrchestratorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn resource(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceResolution {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn persistence(reason: impl Into<String>) -> Self {
        Self::Persistence { reason: reason.into() }
    }

    pub fn resume(reason: impl Into<String>) -> Self {
        Self::ResumeIntegrity { reason: reason.into() }
    }

    pub fn config(field: impl Into<String>) -> Self {
        Self::Configuration { field: field.into() }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal { reason: reason.into() }
    }

    /// Errors that fail a single item without aborting the batch
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            Self::ResourceResolution { .. } | Self::RenderRequest { .. } | Self::Http(_)
        )
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

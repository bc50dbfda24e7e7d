//! User facing progress and notification signals

use serde::{Deserialize, Serialize};

/// Severity of a transient (non-modal) notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Progress bar state plus the "processing item X of Y" line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub percent: f64,
    pub current: usize,
    pub total: usize,
    pub status: String,
}

impl ProgressUpdate {
    /// `current` is zero based; the status line is one based
    pub fn processing(percent: f64, current: usize, total: usize) -> Self {
        Self {
            percent,
            current,
            total,
            status: format!("Processing item {} of {}", (current + 1).min(total), total),
        }
    }

    pub fn finished(total: usize) -> Self {
        Self {
            percent: 100.0,
            current: total,
            total,
            status: "Ready to download".to_string(),
        }
    }
}

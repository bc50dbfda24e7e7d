//! File-backed checkpoint store
//!
//! One JSON record per user under the checkpoint directory, replaced
//! atomically on every save (write to a temp file, then rename).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shared::CheckpointRecord;
use tokio::fs;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::CheckpointStore;

pub struct FileCheckpointStore {
    path: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileCheckpointStore {
    pub fn new(dir: impl AsRef<Path>, user: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", Self::sanitize_user(user))),
            quota_bytes: None,
        }
    }

    /// Reject records whose serialized size exceeds `quota_bytes`
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep user identities usable as file names
    fn sanitize_user(user: &str) -> String {
        let cleaned: String = user
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        if cleaned.is_empty() {
            "local".to_string()
        } else {
            cleaned
        }
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, record: CheckpointRecord) -> OrchestratorResult<()> {
        let json = record.to_json()?;
        if let Some(quota) = self.quota_bytes {
            if json.len() as u64 > quota {
                return Err(OrchestratorError::persistence(format!(
                    "checkpoint of {} bytes exceeds the {} byte quota",
                    json.len(),
                    quota
                )));
            }
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OrchestratorError::persistence(format!("cannot create {}: {e}", parent.display())))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| OrchestratorError::persistence(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| OrchestratorError::persistence(format!("cannot replace {}: {e}", self.path.display())))?;
        Ok(())
    }

    async fn load(&self) -> OrchestratorResult<Option<CheckpointRecord>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(CheckpointRecord::from_json(&raw)?))
    }

    async fn clear(&self) -> OrchestratorResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

//! Engine configuration
//!
//! ## Configuration Sources
//! Values are loaded from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//! 3. Command line flags, which override both
//!
//! ## Keys
//! - `RENDER_API_URL`: render backend base URL (default `http://127.0.0.1:3000`)
//! - `UPLOAD_API_URL`: upload endpoint (default `<render>/api/upload`)
//! - `CHECKPOINT_DIR`: checkpoint directory (default `./.checkpoints`)
//! - `GENERATOR_USER`: identity the checkpoint is keyed by (default `local`)
//! - `EXPECTED_ITEM_SECS`: progress estimate per item (default 45)
//! - `CHECKPOINT_QUOTA_BYTES`: optional checkpoint size limit

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{OrchestratorError, OrchestratorResult};

pub const DEFAULT_RENDER_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_CHECKPOINT_DIR: &str = "./.checkpoints";
pub const DEFAULT_USER: &str = "local";
pub const DEFAULT_EXPECTED_ITEM_SECS: u64 = 45;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub render_url: String,
    pub upload_url: String,
    pub checkpoint_dir: PathBuf,
    pub user: String,
    pub expected_item: Duration,
    pub checkpoint_quota_bytes: Option<u64>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub render_url: Option<String>,
    pub upload_url: Option<String>,
    pub checkpoint_dir: Option<PathBuf>,
    pub user: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_url: DEFAULT_RENDER_URL.to_string(),
            upload_url: default_upload_url(DEFAULT_RENDER_URL),
            checkpoint_dir: PathBuf::from(DEFAULT_CHECKPOINT_DIR),
            user: DEFAULT_USER.to_string(),
            expected_item: Duration::from_secs(DEFAULT_EXPECTED_ITEM_SECS),
            checkpoint_quota_bytes: None,
        }
    }
}

fn default_upload_url(render_url: &str) -> String {
    format!("{}/api/upload", render_url.trim_end_matches('/'))
}

fn parse_number(key: &str, raw: &str) -> OrchestratorResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| OrchestratorError::config(format!("{key} must be a whole number, got '{raw}'")))
}

impl EngineConfig {
    /// Load from `.env` and the process environment
    pub fn from_env() -> OrchestratorResult<Self> {
        // Missing .env is fine
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> OrchestratorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let render_url = value("RENDER_API_URL").unwrap_or_else(|| DEFAULT_RENDER_URL.to_string());
        let upload_url = value("UPLOAD_API_URL").unwrap_or_else(|| default_upload_url(&render_url));
        let checkpoint_dir = value("CHECKPOINT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKPOINT_DIR));
        let user = value("GENERATOR_USER").unwrap_or_else(|| DEFAULT_USER.to_string());

        let expected_secs = match value("EXPECTED_ITEM_SECS") {
            Some(raw) => parse_number("EXPECTED_ITEM_SECS", &raw)?,
            None => DEFAULT_EXPECTED_ITEM_SECS,
        };
        if expected_secs == 0 {
            return Err(OrchestratorError::config("EXPECTED_ITEM_SECS must be at least 1"));
        }

        let checkpoint_quota_bytes = value("CHECKPOINT_QUOTA_BYTES")
            .map(|raw| parse_number("CHECKPOINT_QUOTA_BYTES", &raw))
            .transpose()?;

        Ok(Self {
            render_url,
            upload_url,
            checkpoint_dir,
            user,
            expected_item: Duration::from_secs(expected_secs),
            checkpoint_quota_bytes,
        })
    }

    /// Apply command line values; a new render URL also moves the default upload URL
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(render_url) = overrides.render_url {
            if self.upload_url == default_upload_url(&self.render_url) && overrides.upload_url.is_none() {
                self.upload_url = default_upload_url(&render_url);
            }
            self.render_url = render_url;
        }
        if let Some(upload_url) = overrides.upload_url {
            self.upload_url = upload_url;
        }
        if let Some(dir) = overrides.checkpoint_dir {
            self.checkpoint_dir = dir;
        }
        if let Some(user) = overrides.user {
            self.user = user;
        }
        self
    }
}

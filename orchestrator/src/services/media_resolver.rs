//! Media part → durable URL resolution
//!
//! Parts that already carry a remote URL are used as-is. Local parts are
//! uploaded once and the URL is cached by part id for the rest of the run.
//! Uploads are never retried.

use std::collections::HashMap;
use std::sync::Arc;

use shared::{AudioSelection, AudioTrack, MediaPart};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::AssetUploader;

pub struct MediaResolver<U: AssetUploader> {
    uploader: U,
    cache: Arc<Mutex<HashMap<String, String>>>,
}

impl<U: AssetUploader> MediaResolver<U> {
    pub fn new(uploader: U) -> Self {
        Self {
            uploader,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn cached_url(&self, part_id: &str) -> Option<String> {
        self.cache.lock().await.get(part_id).cloned()
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Durable URL of one part
    pub async fn resolve(&self, part: &MediaPart) -> OrchestratorResult<String> {
        if let Some(url) = part.remote_url() {
            return Ok(url.to_string());
        }
        if let Some(url) = self.cached_url(&part.id).await {
            return Ok(url);
        }

        let path = part
            .local_path()
            .ok_or_else(|| OrchestratorError::resource(part.label(), "part has no source"))?
            .to_path_buf();
        let url = self.uploader.upload(path, part.kind).await?;
        debug!("📎 {} → {}", part.label(), url);

        self.cache.lock().await.insert(part.id.clone(), url.clone());
        Ok(url)
    }

    /// URLs for every part of a combination, in order
    ///
    /// Keeps going after a failed part so the log shows every missing
    /// resource, then fails with the first error since every part is
    /// required.
    pub async fn resolve_all(&self, parts: &[MediaPart]) -> OrchestratorResult<Vec<String>> {
        let mut urls = Vec::with_capacity(parts.len());
        let mut first_error = None;

        for part in parts {
            match self.resolve(part).await {
                Ok(url) => urls.push(url),
                Err(e) => {
                    warn!("⚠️ Could not resolve {}: {}", part.label(), e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(urls),
        }
    }

    /// Audio reference for render payloads
    pub async fn resolve_audio(&self, audio: &AudioSelection) -> OrchestratorResult<AudioTrack> {
        match audio {
            AudioSelection::NoMusic => Ok(AudioTrack::NoMusic),
            AudioSelection::Track { track, start_ms, words } => Ok(AudioTrack::Track {
                url: self.resolve(track).await?,
                start_ms: *start_ms,
                words: words.clone(),
            }),
        }
    }
}

//! HTTP asset uploader
//!
//! Sends the raw bytes of a local file to the storage service with a
//! resource-type hint and returns the durable URL it answers with.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use shared::{MediaKind, UploadResponse};
use tracing::debug;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::services::render_client::normalize_base_url;
use crate::traits::AssetUploader;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct HttpAssetUploader {
    upload_url: String,
    client: reqwest::Client,
}

impl HttpAssetUploader {
    pub fn new(upload_url: &str) -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        Ok(Self::with_client(upload_url, client))
    }

    pub fn with_client(upload_url: &str, client: reqwest::Client) -> Self {
        Self {
            upload_url: normalize_base_url(upload_url),
            client,
        }
    }
}

fn content_type(kind: MediaKind, path: &std::path::Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match (kind, extension.as_str()) {
        (MediaKind::Image, "png") => "image/png",
        (MediaKind::Image, "webp") => "image/webp",
        (MediaKind::Image, _) => "image/jpeg",
        (MediaKind::Video, "mov") => "video/quicktime",
        (MediaKind::Video, "webm") => "video/webm",
        (MediaKind::Video, "mp3") => "audio/mpeg",
        (MediaKind::Video, _) => "video/mp4",
    }
}

#[async_trait]
impl AssetUploader for HttpAssetUploader {
    async fn upload(&self, path: PathBuf, kind: MediaKind) -> OrchestratorResult<String> {
        let resource = path.display().to_string();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| OrchestratorError::resource(&resource, format!("cannot read file: {e}")))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        debug!("⬆️ Uploading {} ({} bytes, {})", file_name, bytes.len(), kind);

        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("resourceType", kind.to_string()), ("fileName", file_name)])
            .header("Content-Type", content_type(kind, &path))
            .body(bytes)
            .send()
            .await
            .map_err(|e| OrchestratorError::resource(&resource, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::resource(
                &resource,
                format!("upload rejected with {status}: {}", body.trim()),
            ));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| OrchestratorError::resource(&resource, format!("bad upload response: {e}")))?;
        if uploaded.url.is_empty() {
            return Err(OrchestratorError::resource(&resource, "upload returned an empty URL"));
        }
        Ok(uploaded.url)
    }
}

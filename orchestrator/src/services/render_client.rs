//! HTTP render API client
//!
//! POSTs one JSON job to the endpoint of its mode and waits for the media
//! reference. Failed requests are never retried here.

use std::time::Duration;

use async_trait::async_trait;
use shared::{GenerationMode, RenderRequest, RenderResponse};
use tracing::debug;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::RenderApi;

/// Renders can take minutes; the client only gives up on a hung backend
const RENDER_TIMEOUT: Duration = Duration::from_secs(600);

/// Production render backend client
#[derive(Clone)]
pub struct HttpRenderApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRenderApi {
    pub fn new(render_addr: &str) -> OrchestratorResult<Self> {
        let client = reqwest::Client::builder().timeout(RENDER_TIMEOUT).build()?;
        Ok(Self::with_client(render_addr, client))
    }

    pub fn with_client(render_addr: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: normalize_base_url(render_addr),
            client,
        }
    }

    pub fn endpoint(&self, mode: GenerationMode) -> String {
        format!("{}{}", self.base_url, mode.render_path())
    }
}

/// `host:port` or full URL, without a trailing slash
pub(crate) fn normalize_base_url(addr: &str) -> String {
    let base = if addr.starts_with("http") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    };
    base.trim_end_matches('/').to_string()
}

/// Server error text from a failure body, falling back to the raw body
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<RenderResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error_text().map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.to_string())
}

#[async_trait]
impl RenderApi for HttpRenderApi {
    async fn render(&self, mode: GenerationMode, request: RenderRequest) -> OrchestratorResult<RenderResponse> {
        let url = self.endpoint(mode);
        debug!("🎬 POST {} (item {})", url, request.index);

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::RenderRequest {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let parsed: RenderResponse = response.json().await?;
        if parsed.media_urls().is_empty() {
            return Err(OrchestratorError::RenderRequest {
                status: status.as_u16(),
                message: parsed
                    .error_text()
                    .unwrap_or("render response carried no media")
                    .to_string(),
            });
        }
        Ok(parsed)
    }
}

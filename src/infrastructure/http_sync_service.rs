//! HTTP implementation of the sync service boundary
//!
//! Talks to the store backend's REST endpoints with a single shared
//! reqwest client. Every call is bounded by the configured request
//! timeout; expiry surfaces as a transport error, which the poller treats
//! as a transient tick failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::domain::catalog::{CategoryId, SuperCategory};
use crate::domain::job::{CategoryVisibility, JobAccepted, JobStatus, SyncSelection};
use crate::domain::services::sync_service::{SyncError, SyncService};
use crate::infrastructure::config::SyncConfig;

/// Sync service backed by the store backend's REST API.
pub struct HttpSyncService {
    client: Client,
    base_url: Url,
}

/// Acknowledgement body shared by the start/stop endpoints.
#[derive(Debug, Deserialize)]
struct AckBody {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
}

impl HttpSyncService {
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .cookie_store(true)
            .build()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let base_url = normalize_base_url(&config.base_url)?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        self.base_url
            .join(path)
            .map_err(|e| SyncError::UnexpectedResponse(format!("invalid endpoint {path}: {e}")))
    }

    /// Maps the backend's `{"success": ..., "message"/"error": ...}` shape
    /// onto `JobAccepted`. Non-2xx responses with a decodable error body
    /// become `Rejected`; anything else is a transport failure.
    async fn ack(response: Response) -> Result<JobAccepted, SyncError> {
        let status = response.status();
        let body: AckBody = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Err(SyncError::UnexpectedResponse(e.to_string()));
            }
            Err(_) => return Err(SyncError::Transport(format!("backend returned {status}"))),
        };

        if status.is_success() && body.success {
            return Ok(JobAccepted { accepted: true, message: body.message });
        }
        let reason = body
            .error
            .or(body.message)
            .unwrap_or_else(|| format!("backend returned {status}"));
        if status.is_success() {
            Ok(JobAccepted { accepted: false, message: Some(reason) })
        } else {
            Err(SyncError::Rejected(reason))
        }
    }
}

#[async_trait]
impl SyncService for HttpSyncService {
    async fn fetch_catalog_tree(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<SuperCategory>, SyncError> {
        let url = self.endpoint("navigation")?;
        debug!(include_inactive, "fetching catalog tree");
        let response = self
            .client
            .get(url)
            .query(&[("include_inactive", include_inactive)])
            .send()
            .await
            .map_err(transport)?;
        decode_json(response).await
    }

    async fn start_job(&self, selection: &SyncSelection) -> Result<JobAccepted, SyncError> {
        let url = self.endpoint("cex-refresh")?;
        debug!(
            categories = selection.category_ids.len(),
            product_lines = selection.product_line_ids.len(),
            "submitting refresh job"
        );
        let response = self
            .client
            .post(url)
            .json(selection)
            .send()
            .await
            .map_err(transport)?;
        Self::ack(response).await
    }

    async fn get_job_status(&self) -> Result<JobStatus, SyncError> {
        let url = self.endpoint("cex-refresh/status")?;
        let response = self.client.get(url).send().await.map_err(transport)?;
        decode_json(response).await
    }

    async fn stop_job(&self) -> Result<JobAccepted, SyncError> {
        let url = self.endpoint("cex-refresh/stop")?;
        let response = self.client.post(url).send().await.map_err(transport)?;
        Self::ack(response).await
    }

    async fn toggle_category_visibility(
        &self,
        category_id: CategoryId,
    ) -> Result<CategoryVisibility, SyncError> {
        let url = self.endpoint("categories/toggle")?;
        let response = self
            .client
            .post(url)
            .json(&json!({ "id": category_id }))
            .send()
            .await
            .map_err(transport)?;
        decode_json(response).await
    }
}

fn transport(err: reqwest::Error) -> SyncError {
    SyncError::Transport(err.to_string())
}

/// Parses the configured base URL and guarantees a trailing slash so that
/// `Url::join` appends endpoint paths instead of replacing the last segment.
fn normalize_base_url(base_url: &str) -> Result<Url, SyncError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| SyncError::UnexpectedResponse(format!("invalid base url: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, SyncError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SyncError::Transport(format!("backend returned {status}")));
    }
    response
        .json()
        .await
        .map_err(|e| SyncError::UnexpectedResponse(e.to_string()))
}

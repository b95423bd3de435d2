//! Remote file store seam and its HTTP implementation.

use async_trait::async_trait;
use shared_types::{FileContent, FileQuery, UpdateFileRequest};
use std::time::Duration;

use crate::target::Target;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

/// Durable storage for whole files.
#[async_trait]
pub trait RemoteFileStore: Send + Sync + 'static {
    async fn load(&self, target: &Target) -> Result<String, StoreError>;

    /// Overwrite the whole file. `Ok` is the acknowledgement.
    async fn save(&self, target: &Target, content: &str) -> Result<(), StoreError>;
}

/// Talks to the file server's `/files` API.
#[derive(Debug, Clone)]
pub struct HttpFileStore {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFileStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl RemoteFileStore for HttpFileStore {
    async fn load(&self, target: &Target) -> Result<String, StoreError> {
        let query = FileQuery {
            project_name: target.project().to_string(),
            path: target.path().to_string(),
        };
        let response = self
            .client
            .get(format!("{}/files", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: FileContent = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(body.content)
    }

    async fn save(&self, target: &Target, content: &str) -> Result<(), StoreError> {
        let request = UpdateFileRequest {
            project_name: target.project().to_string(),
            path: target.path().to_string(),
            content: content.to_string(),
        };
        let response = self
            .client
            .post(format!("{}/files/update", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}

/// Any non-2xx status is a failure; prefer the server's `error` message.
async fn status_error(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    StoreError::Status {
        status: status.as_u16(),
        message: describe_error_body(status.canonical_reason(), body),
    }
}

fn describe_error_body(reason: Option<&str>, body: String) -> String {
    if body.trim().is_empty() {
        return reason.unwrap_or("request failed").to_string();
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(error) = json.get("error").and_then(|v| v.as_str()) {
            return error.to_string();
        }
        if let Some(message) = json.get("message").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }

    body
}

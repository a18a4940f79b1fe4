//! # Upload Collaborator
//!
//! The single operation the queue needs from the outside world: deliver one
//! report to the server and say whether it was accepted.
//!
//! `ReportUploader` is the seam. `HttpUploader` implements it against a JSON
//! endpoint; tests substitute their own implementations.
//!
//! ## Failure classification
//!
//! Every failure is an `UploadError`. Most are transient (network down,
//! timeout, 5xx, 408, 429) and the report stays queued. A 4xx rejection is
//! permanent: retrying the same payload will not change the answer.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::shared::ReportPayload;

/// Path of the report endpoint relative to the server URL
pub const REPORTS_PATH: &str = "/api/reports";

/// Upload failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// Connection could not be made or was dropped
    #[error("Network error: {0}")]
    Network(String),

    /// The server did not answer in time
    #[error("Upload timed out")]
    Timeout,

    /// Server-side failure, worth retrying
    #[error("Server error: {status}")]
    Server {
        status: u16,
    },

    /// Server refused the payload
    #[error("Rejected with status {status}: {message}")]
    Rejected {
        status: u16,
        message: String,
    },
}

impl UploadError {
    /// Whether retrying the same payload can never succeed
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let code = status.as_u16();
        let transient = status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS;
        if transient || !status.is_client_error() {
            Self::Server { status: code }
        } else {
            let message = if body.is_empty() {
                status.to_string()
            } else {
                body
            };
            Self::Rejected {
                status: code,
                message,
            }
        }
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Delivers a single report to the server
#[async_trait]
pub trait ReportUploader: Send + Sync {
    /// Upload one report. `Ok(())` means the server durably recorded it.
    async fn upload(&self, payload: &ReportPayload) -> Result<(), UploadError>;
}

/// JSON-over-HTTP uploader
#[derive(Debug, Clone)]
pub struct HttpUploader {
    client: Client,
    endpoint: String,
}

impl HttpUploader {
    /// Create an uploader posting to `{server_url}/api/reports`
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", server_url.trim_end_matches('/'), REPORTS_PATH),
        })
    }

    /// Create an uploader from application config
    pub fn from_config(config: &Config) -> Result<Self, UploadError> {
        Self::new(config.server_url(), config.upload_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReportUploader for HttpUploader {
    async fn upload(&self, payload: &ReportPayload) -> Result<(), UploadError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Idempotency-Key", payload.client_ref.to_string())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(UploadError::from_status(status, body))
    }
}

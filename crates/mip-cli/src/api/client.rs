//! HTTP client for the ingestion server
//!
//! Thin wrapper over reqwest that speaks the chunk submission and session
//! status endpoints. Transport failures and 5xx responses are surfaced as
//! transient errors for the retry layer; non-duplicate 4xx responses are
//! decoded into fatal `CliError::Api` values.

use crate::api::{endpoints, types::ErrorEnvelope};
use crate::error::{CliError, Result};
use mip_common::{IngestAck, StatusResponse};
use reqwest::Client;
use std::time::Duration;

/// Default timeout for API requests in seconds.
/// Can be overridden via MIP_API_TIMEOUT_SECS environment variable.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 60;

/// Default server URL when not specified via flag or environment variable.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// API client for the ingestion server
pub struct IngestClient {
    client: Client,
    submit_url: String,
    status_url: Option<String>,
    bearer: String,
}

impl IngestClient {
    /// Create a new client from explicit endpoint URLs
    pub fn new(
        submit_url: String,
        status_url: Option<String>,
        bearer: String,
    ) -> Result<Self> {
        let timeout_secs = std::env::var("MIP_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            submit_url,
            status_url,
            bearer,
        })
    }

    /// Whether a status endpoint was configured
    pub fn has_status_endpoint(&self) -> bool {
        self.status_url.is_some()
    }

    /// Submit one chunk artifact body under (idempotency key, seq).
    ///
    /// `gzip` marks the body as already compressed; the server gunzips it
    /// on the way in.
    pub async fn submit_chunk(
        &self,
        idempotency_key: &str,
        seq: u64,
        body: Vec<u8>,
        gzip: bool,
    ) -> Result<IngestAck> {
        let mut request = self
            .client
            .post(&self.submit_url)
            .bearer_auth(&self.bearer)
            .header("Idempotency-Key", idempotency_key)
            .header("X-Batch-Seq", seq.to_string())
            .header("Content-Type", "application/x-ndjson");

        if gzip {
            request = request.header("Content-Encoding", "gzip");
        }

        let response = request.body(body).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<IngestAck>().await?);
        }

        Err(CliError::api(status.as_u16(), error_message(response).await))
    }

    /// Query the session tracker for resume information
    pub async fn fetch_status(&self, idempotency_key: &str) -> Result<StatusResponse> {
        let status_url = self
            .status_url
            .as_deref()
            .ok_or_else(|| CliError::config("no status endpoint configured"))?;
        let url = endpoints::status_url(status_url, idempotency_key);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<StatusResponse>().await?);
        }

        Err(CliError::api(status.as_u16(), error_message(response).await))
    }
}

/// Pull a human-readable message out of an error response, falling back to
/// the raw body when it is not the usual envelope.
async fn error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.is_empty() => "empty response body".to_string(),
        Err(_) => body,
    }
}

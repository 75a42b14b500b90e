//! API endpoint URL builders

/// Build the NDJSON chunk submission URL
pub fn submit_ndjson_url(base_url: &str) -> String {
    format!("{}/api/v1/submit/ndjson", base_url.trim_end_matches('/'))
}

/// Build the session status URL for an idempotency key
pub fn status_url(status_endpoint: &str, idempotency_key: &str) -> String {
    format!(
        "{}?idempotency_key={}",
        status_endpoint.trim_end_matches('/'),
        idempotency_key
    )
}

/// Build the ingest status endpoint URL from a server base URL
pub fn ingest_status_url(base_url: &str) -> String {
    format!("{}/api/v1/ingest/status", base_url.trim_end_matches('/'))
}

/// Build health check URL
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", base_url.trim_end_matches('/'))
}

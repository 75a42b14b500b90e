//! Session status query
//!
//! Read-only resume support: the orchestrator asks for `next_expected_seq`
//! under (publisher, idempotency key) before re-sending anything, and
//! operators use the same query to inspect stuck sessions.

use mip_common::types::StatusResponse;
use sqlx::PgPool;

use crate::db::sessions;
use crate::error::AppError;

/// Query for the progress of one ingestion session
#[derive(Debug, Clone)]
pub struct GetStatusQuery {
    pub publisher: String,
    pub idempotency_key: String,
}

/// Handles the status query
///
/// A session with no recorded progress reports `in_progress` at seq 0, so a
/// fresh upload and a never-started upload resolve identically.
#[tracing::instrument(skip(pool), fields(publisher = %query.publisher, idem_key = %query.idempotency_key))]
pub async fn handle(pool: &PgPool, query: GetStatusQuery) -> Result<StatusResponse, AppError> {
    let row = sessions::fetch_session(pool, &query.publisher, &query.idempotency_key).await?;

    let response = match row {
        Some(row) => StatusResponse {
            status: row.status,
            next_expected_seq: row.next_expected_seq.max(0) as u64,
        },
        None => StatusResponse::fresh(),
    };

    tracing::debug!(
        status = %response.status,
        next_expected_seq = response.next_expected_seq,
        "Session status resolved"
    );

    Ok(response)
}

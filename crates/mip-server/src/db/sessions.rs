//! Ingest session rows
//!
//! Raw row access only; the state machine transitions are owned by the
//! `features::sessions` command handlers.

use mip_common::types::SessionStatus;
use sqlx::PgPool;

use crate::error::AppError;

/// A session row as stored in `ingest_sessions`.
#[derive(Debug, Clone)]
pub struct SessionRow {
    pub status: SessionStatus,
    pub next_expected_seq: i64,
}

/// Fetch the session for (publisher, idempotency key), if one exists.
pub async fn fetch_session(
    pool: &PgPool,
    publisher: &str,
    idempotency_key: &str,
) -> Result<Option<SessionRow>, AppError> {
    let row: Option<(String, i64)> = sqlx::query_as(
        "SELECT status, next_expected_seq FROM ingest_sessions \
         WHERE publisher = $1 AND idempotency_key = $2",
    )
    .bind(publisher)
    .bind(idempotency_key)
    .fetch_optional(pool)
    .await?;

    row.map(|(status, next_expected_seq)| {
        let status = status
            .parse::<SessionStatus>()
            .map_err(AppError::Internal)?;
        Ok(SessionRow {
            status,
            next_expected_seq,
        })
    })
    .transpose()
}

/// Set the status of an existing session. Returns whether a row was updated.
///
/// Callers must have validated the transition; this only writes it.
pub async fn set_status(
    pool: &PgPool,
    publisher: &str,
    idempotency_key: &str,
    status: SessionStatus,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "UPDATE ingest_sessions SET status = $3, last_update = now() \
         WHERE publisher = $1 AND idempotency_key = $2",
    )
    .bind(publisher)
    .bind(idempotency_key)
    .bind(status.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

//! Mark stale command
//!
//! Administrative transition `in_progress -> stale`: prior progress should no
//! longer be trusted for resumption, but nothing blocks a restart. Committed
//! records stay in place and dedup still applies to any resend.

use mip_common::types::{SessionStatus, StatusResponse};
use sqlx::PgPool;

use crate::db::sessions;
use crate::error::AppError;

/// Command to mark a session stale
#[derive(Debug, Clone)]
pub struct MarkStaleCommand {
    pub publisher: String,
    pub idempotency_key: String,
}

#[tracing::instrument(skip(pool), fields(publisher = %command.publisher, idem_key = %command.idempotency_key))]
pub async fn handle(pool: &PgPool, command: MarkStaleCommand) -> Result<StatusResponse, AppError> {
    let row = sessions::fetch_session(pool, &command.publisher, &command.idempotency_key)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No ingest session for idempotency key '{}'",
                command.idempotency_key
            ))
        })?;

    match row.status {
        SessionStatus::Complete => {
            return Err(AppError::BadRequest(
                "A complete session is terminal and cannot be marked stale".to_string(),
            ));
        },
        SessionStatus::Stale => {
            tracing::debug!("Session already stale, mark-stale is a no-op");
        },
        SessionStatus::InProgress => {
            sessions::set_status(
                pool,
                &command.publisher,
                &command.idempotency_key,
                SessionStatus::Stale,
            )
            .await?;
            tracing::warn!(
                next_expected_seq = row.next_expected_seq,
                "Session marked stale by administrative action"
            );
        },
    }

    Ok(StatusResponse {
        status: SessionStatus::Stale,
        next_expected_seq: row.next_expected_seq.max(0) as u64,
    })
}

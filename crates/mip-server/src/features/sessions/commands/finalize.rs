//! Finalize session command
//!
//! The end-of-stream signal: `in_progress -> complete`. Complete is terminal,
//! so finalizing an already-complete session is an idempotent no-op.

use mip_common::types::{SessionStatus, StatusResponse};
use sqlx::PgPool;

use crate::db::sessions;
use crate::error::AppError;

/// Command to mark a session complete
#[derive(Debug, Clone)]
pub struct FinalizeSessionCommand {
    pub publisher: String,
    pub idempotency_key: String,
}

#[tracing::instrument(skip(pool), fields(publisher = %command.publisher, idem_key = %command.idempotency_key))]
pub async fn handle(
    pool: &PgPool,
    command: FinalizeSessionCommand,
) -> Result<StatusResponse, AppError> {
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
            tracing::debug!("Session already complete, finalize is a no-op");
        },
        SessionStatus::Stale => {
            return Err(AppError::BadRequest(
                "A stale session cannot be finalized; restart the upload first".to_string(),
            ));
        },
        SessionStatus::InProgress => {
            sessions::set_status(
                pool,
                &command.publisher,
                &command.idempotency_key,
                SessionStatus::Complete,
            )
            .await?;
            tracing::info!(
                next_expected_seq = row.next_expected_seq,
                "Session finalized"
            );
        },
    }

    Ok(StatusResponse {
        status: SessionStatus::Complete,
        next_expected_seq: row.next_expected_seq.max(0) as u64,
    })
}

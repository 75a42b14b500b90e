//! Submit record command
//!
//! Stores a single record outside any tracked session. The record still goes
//! through the dedup store under a synthetic per-request idempotency key so
//! every durable row satisfies the same uniqueness tuple.

use mip_common::types::IngestAck;
use serde_json::Value;
use uuid::Uuid;

use crate::db::DedupStore;
use crate::error::AppError;

/// Command to store one untracked record
#[derive(Debug, Clone)]
pub struct SubmitRecordCommand {
    pub publisher: String,
    pub body: Value,
}

#[tracing::instrument(skip(store, command), fields(publisher = %command.publisher))]
pub async fn handle<S: DedupStore>(
    store: &S,
    command: SubmitRecordCommand,
) -> Result<IngestAck, AppError> {
    let synthetic_key = format!("single-{}", Uuid::new_v4());

    let inserted = store
        .insert_record(&command.publisher, &synthetic_key, 0, 0, &command.body)
        .await?;

    tracing::debug!(inserted, "Single record stored");

    Ok(IngestAck::untracked(u64::from(inserted)))
}

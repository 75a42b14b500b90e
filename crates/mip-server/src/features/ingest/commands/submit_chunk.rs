//! Submit chunk command
//!
//! Commits one chunk of records for a tracked session. The command is the
//! convergence point for all idempotent submission paths: the JSON-array
//! batch endpoint and the NDJSON endpoint both fold into it once their
//! bodies are decoded.

use mip_common::types::IngestAck;
use serde_json::Value;

use crate::db::DedupStore;
use crate::error::AppError;

/// Command to commit one chunk under (publisher, idempotency key, seq).
///
/// Resubmitting an identical command is safe: every record that already
/// landed is reported as present rather than re-inserted, and the response
/// carries `duplicate = true` when nothing was new.
#[derive(Debug, Clone)]
pub struct SubmitChunkCommand {
    pub publisher: String,
    pub idempotency_key: String,
    pub seq: i64,
    pub records: Vec<Value>,
}

/// Errors that can occur when committing a chunk
#[derive(Debug, thiserror::Error)]
pub enum SubmitChunkError {
    /// The idempotency key was empty
    #[error("Idempotency-Key must not be empty")]
    EmptyIdempotencyKey,
    /// The sequence number was negative
    #[error("Chunk sequence must be a non-negative integer, got {0}")]
    NegativeSeq(i64),
    /// The sequence number has no successor in storage
    #[error("Chunk sequence {0} is too large")]
    SeqTooLarge(i64),
    /// The chunk carries more records than the configured limit
    #[error("Chunk of {count} records exceeds the {limit} record limit; re-plan with a smaller chunk size")]
    TooManyRecords { count: usize, limit: usize },
    /// A database error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<SubmitChunkError> for AppError {
    fn from(err: SubmitChunkError) -> Self {
        match err {
            SubmitChunkError::EmptyIdempotencyKey
            | SubmitChunkError::NegativeSeq(_)
            | SubmitChunkError::SeqTooLarge(_) => AppError::Validation(err.to_string()),
            SubmitChunkError::TooManyRecords { .. } => AppError::PayloadTooLarge(err.to_string()),
            SubmitChunkError::Database(e) => AppError::Database(e),
        }
    }
}

impl SubmitChunkCommand {
    /// Validates the command parameters against the configured record limit
    pub fn validate(&self, max_records: usize) -> Result<(), SubmitChunkError> {
        if self.idempotency_key.trim().is_empty() {
            return Err(SubmitChunkError::EmptyIdempotencyKey);
        }
        if self.seq < 0 {
            return Err(SubmitChunkError::NegativeSeq(self.seq));
        }
        // The session tracker stores seq + 1 as the next expected value.
        if self.seq == i64::MAX {
            return Err(SubmitChunkError::SeqTooLarge(self.seq));
        }
        if self.records.len() > max_records {
            return Err(SubmitChunkError::TooManyRecords {
                count: self.records.len(),
                limit: max_records,
            });
        }
        Ok(())
    }
}

/// Handles the submit chunk command
///
/// All record inserts and the session high-water-mark update happen in one
/// storage transaction; a chunk is never partially accepted from the caller's
/// point of view. Uniqueness conflicts on individual records count as
/// "already present", so a chunk that partially landed earlier converges to
/// the same final state as one committed in a single shot.
#[tracing::instrument(skip(store, command), fields(publisher = %command.publisher, idem_key = %command.idempotency_key, seq = command.seq, records = command.records.len()))]
pub async fn handle<S: DedupStore>(
    store: &S,
    command: SubmitChunkCommand,
    max_records: usize,
) -> Result<IngestAck, SubmitChunkError> {
    command.validate(max_records)?;

    let commit = store
        .commit_chunk(
            &command.publisher,
            &command.idempotency_key,
            command.seq,
            &command.records,
        )
        .await?;

    let ack = IngestAck::for_chunk(
        commit.inserted,
        command.records.len(),
        commit.next_expected_seq as u64,
    );

    if ack.duplicate {
        tracing::debug!(seq = command.seq, "Chunk already fully present, treated as success");
    } else {
        tracing::info!(
            seq = command.seq,
            inserted = commit.inserted,
            next_expected_seq = commit.next_expected_seq,
            "Chunk committed"
        );
    }

    Ok(ack)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(records: usize) -> SubmitChunkCommand {
        SubmitChunkCommand {
            publisher: "pub@example.org".to_string(),
            idempotency_key: "11111111-1111-1111-1111-111111111111".to_string(),
            seq: 0,
            records: (0..records).map(|i| serde_json::json!({ "i": i })).collect(),
        }
    }

    #[test]
    fn test_validate_accepts_bounded_chunk() {
        assert!(command(10).validate(10).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_key() {
        let mut cmd = command(1);
        cmd.idempotency_key = "  ".to_string();
        assert!(matches!(
            cmd.validate(10),
            Err(SubmitChunkError::EmptyIdempotencyKey)
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_chunk() {
        assert!(matches!(
            command(11).validate(10),
            Err(SubmitChunkError::TooManyRecords { count: 11, limit: 10 })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_seq() {
        let mut cmd = command(1);
        cmd.seq = -5;
        assert!(matches!(cmd.validate(10), Err(SubmitChunkError::NegativeSeq(-5))));
    }

    #[test]
    fn test_validate_rejects_seq_without_successor() {
        let mut cmd = command(1);
        cmd.seq = i64::MAX;
        assert!(matches!(
            cmd.validate(10),
            Err(SubmitChunkError::SeqTooLarge(i64::MAX))
        ));
    }
}

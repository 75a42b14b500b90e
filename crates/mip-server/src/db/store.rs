//! Dedup store: write-if-absent metric record persistence
//!
//! The uniqueness constraint on (publisher, idempotency_key, seq,
//! record_offset) lives in the storage layer, not in application locks: two
//! concurrent attempts to write the same tuple leave exactly one durable row
//! and surface the conflict as "already present". The trait keeps this
//! capability swappable for any engine with atomic unique-insert semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// Outcome of committing one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCommit {
    /// Records newly inserted by this commit (conflicts excluded)
    pub inserted: u64,
    /// Session high-water mark after the commit (max committed seq + 1)
    pub next_expected_seq: i64,
}

/// Write-if-absent storage for metric records.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Commit all records of a chunk and advance the session high-water mark,
    /// atomically. Individual uniqueness conflicts are counted as "already
    /// present", never as failures, so a partially-committed chunk converges
    /// to the same state as one committed in a single shot.
    async fn commit_chunk(
        &self,
        publisher: &str,
        idempotency_key: &str,
        seq: i64,
        bodies: &[serde_json::Value],
    ) -> Result<ChunkCommit, sqlx::Error>;

    /// Insert a single record outside any tracked session. Returns whether a
    /// row was actually written.
    async fn insert_record(
        &self,
        publisher: &str,
        idempotency_key: &str,
        seq: i64,
        offset: i64,
        body: &serde_json::Value,
    ) -> Result<bool, sqlx::Error>;
}

/// PostgreSQL-backed dedup store.
#[derive(Clone)]
pub struct PgDedupStore {
    pool: PgPool,
}

impl PgDedupStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_RECORD_SQL: &str = "\
    INSERT INTO metric_records (publisher, idempotency_key, seq, record_offset, body) \
    VALUES ($1, $2, $3, $4, $5) \
    ON CONFLICT (publisher, idempotency_key, seq, record_offset) DO NOTHING";

// The session upsert is part of the same transaction as the record inserts:
// if any record write of a chunk lands, the high-water mark reflects at least
// seq + 1. GREATEST keeps out-of-order deliveries from moving it backwards,
// and a complete session never reverts to in_progress.
const UPSERT_SESSION_SQL: &str = "\
    INSERT INTO ingest_sessions (publisher, idempotency_key, next_expected_seq, status) \
    VALUES ($1, $2, $3, 'in_progress') \
    ON CONFLICT (publisher, idempotency_key) DO UPDATE SET \
        next_expected_seq = GREATEST(ingest_sessions.next_expected_seq, EXCLUDED.next_expected_seq), \
        status = CASE \
            WHEN ingest_sessions.status = 'stale' THEN 'in_progress' \
            ELSE ingest_sessions.status \
        END, \
        last_update = now() \
    RETURNING next_expected_seq";

#[async_trait]
impl DedupStore for PgDedupStore {
    async fn commit_chunk(
        &self,
        publisher: &str,
        idempotency_key: &str,
        seq: i64,
        bodies: &[serde_json::Value],
    ) -> Result<ChunkCommit, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let mut inserted = 0u64;
        for (offset, body) in bodies.iter().enumerate() {
            let result = sqlx::query(INSERT_RECORD_SQL)
                .bind(publisher)
                .bind(idempotency_key)
                .bind(seq)
                .bind(offset as i64)
                .bind(body)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }

        let next_expected_seq: i64 = sqlx::query_scalar(UPSERT_SESSION_SQL)
            .bind(publisher)
            .bind(idempotency_key)
            .bind(seq + 1)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ChunkCommit {
            inserted,
            next_expected_seq,
        })
    }

    async fn insert_record(
        &self,
        publisher: &str,
        idempotency_key: &str,
        seq: i64,
        offset: i64,
        body: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(INSERT_RECORD_SQL)
            .bind(publisher)
            .bind(idempotency_key)
            .bind(seq)
            .bind(offset)
            .bind(body)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Count stored records for a session, for tests and operator queries.
pub async fn count_records(
    pool: &PgPool,
    publisher: &str,
    idempotency_key: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM metric_records WHERE publisher = $1 AND idempotency_key = $2",
    )
    .bind(publisher)
    .bind(idempotency_key)
    .fetch_one(pool)
    .await
}

/// One stored record as surfaced back to its publisher.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoredRecord {
    pub idempotency_key: String,
    pub seq: i64,
    pub record_offset: i64,
    pub body: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

/// List a publisher's stored records, newest first, optionally narrowed to
/// one idempotency key.
pub async fn list_records(
    pool: &PgPool,
    publisher: &str,
    idempotency_key: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<StoredRecord>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT idempotency_key, seq, record_offset, body, received_at
        FROM metric_records
        WHERE publisher = $1
          AND ($2::TEXT IS NULL OR idempotency_key = $2)
        ORDER BY received_at DESC, seq DESC, record_offset DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(publisher)
    .bind(idempotency_key)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Total stored records matching the same filter as [`list_records`].
pub async fn count_publisher_records(
    pool: &PgPool,
    publisher: &str,
    idempotency_key: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM metric_records
        WHERE publisher = $1
          AND ($2::TEXT IS NULL OR idempotency_key = $2)
        "#,
    )
    .bind(publisher)
    .bind(idempotency_key)
    .fetch_one(pool)
    .await
}

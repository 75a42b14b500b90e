//! Stored-record listing query
//!
//! Lets a publisher read back what actually landed, newest first. Scoped to
//! the authenticated publisher; the optional idempotency key narrows the
//! listing to one upload session.

use serde::Serialize;
use sqlx::PgPool;

use crate::db::store::{self, StoredRecord};
use crate::error::AppError;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

/// Query for a publisher's stored records
#[derive(Debug, Clone)]
pub struct ListRecordsQuery {
    pub publisher: String,
    pub idempotency_key: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One page of a publisher's stored records
#[derive(Debug, Clone, Serialize)]
pub struct ListRecordsResponse {
    pub ok: bool,
    pub total: i64,
    pub records: Vec<StoredRecord>,
}

/// Handles the list records query
#[tracing::instrument(skip(pool, query), fields(publisher = %query.publisher))]
pub async fn handle(
    pool: &PgPool,
    query: ListRecordsQuery,
) -> Result<ListRecordsResponse, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);
    let key = query.idempotency_key.as_deref();

    let records = store::list_records(pool, &query.publisher, key, limit, offset).await?;
    let total = store::count_publisher_records(pool, &query.publisher, key).await?;

    tracing::debug!(total, returned = records.len(), "Stored records listed");

    Ok(ListRecordsResponse {
        ok: true,
        total,
        records,
    })
}

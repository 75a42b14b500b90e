use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use super::commands::{submit_chunk, submit_record, SubmitChunkCommand, SubmitRecordCommand};
use super::queries::list_records::{self, ListRecordsQuery};
use super::queries::status::{self, GetStatusQuery};
use super::types::{decode_body, decode_ndjson, ChunkHeaders};
use crate::error::AppError;
use crate::features::IngestState;
use crate::identity::Publisher;

pub fn submit_routes() -> Router<IngestState> {
    Router::new()
        .route("/", post(submit_one))
        .route("/batch", post(submit_batch))
        .route("/ndjson", post(submit_ndjson))
}

pub fn status_routes() -> Router<IngestState> {
    Router::new().route("/status", get(ingest_status))
}

pub fn metrics_routes() -> Router<IngestState> {
    Router::new().route("/me", get(list_my_records))
}

#[tracing::instrument(skip(state, publisher, body), fields(publisher = %publisher))]
async fn submit_one(
    State(state): State<IngestState>,
    publisher: Publisher,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let command = SubmitRecordCommand {
        publisher: publisher.0,
        body,
    };

    let ack = submit_record::handle(&state.store, command).await?;

    Ok((StatusCode::OK, Json(ack)).into_response())
}

#[tracing::instrument(skip(state, publisher, headers, records), fields(publisher = %publisher))]
async fn submit_batch(
    State(state): State<IngestState>,
    publisher: Publisher,
    headers: HeaderMap,
    Json(records): Json<Vec<Value>>,
) -> Result<Response, AppError> {
    let chunk = ChunkHeaders::require(&headers)?;

    let command = SubmitChunkCommand {
        publisher: publisher.0,
        idempotency_key: chunk.idempotency_key,
        seq: chunk.seq,
        records,
    };

    let ack = submit_chunk::handle(&state.store, command, state.limits.max_batch_records)
        .await
        .map_err(AppError::from)?;

    Ok((StatusCode::OK, Json(ack)).into_response())
}

#[tracing::instrument(skip(state, publisher, headers, body), fields(publisher = %publisher, bytes = body.len()))]
async fn submit_ndjson(
    State(state): State<IngestState>,
    publisher: Publisher,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let decoded = decode_body(&headers, &body, state.limits.max_body_bytes)?;
    let records = decode_ndjson(&decoded)?;

    let ack = match ChunkHeaders::extract(&headers)? {
        Some(chunk) => {
            let command = SubmitChunkCommand {
                publisher: publisher.0,
                idempotency_key: chunk.idempotency_key,
                seq: chunk.seq,
                records,
            };
            submit_chunk::handle(&state.store, command, state.limits.max_batch_records)
                .await
                .map_err(AppError::from)?
        },
        // No idempotency headers: untracked stream under a synthetic key.
        None => {
            let mut inserted = 0u64;
            for record in &records {
                let command = SubmitRecordCommand {
                    publisher: publisher.0.clone(),
                    body: record.clone(),
                };
                inserted += submit_record::handle(&state.store, command).await?.inserted;
            }
            mip_common::types::IngestAck::untracked(inserted)
        },
    };

    Ok((StatusCode::OK, Json(ack)).into_response())
}

#[derive(Debug, Deserialize)]
struct ListParams {
    idempotency_key: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[tracing::instrument(skip(state, publisher, params), fields(publisher = %publisher))]
async fn list_my_records(
    State(state): State<IngestState>,
    publisher: Publisher,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let query = ListRecordsQuery {
        publisher: publisher.0,
        idempotency_key: params.idempotency_key,
        limit: params.limit,
        offset: params.offset,
    };

    let response = list_records::handle(&state.db, query).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    idempotency_key: String,
}

#[tracing::instrument(skip(state, publisher, params), fields(publisher = %publisher))]
async fn ingest_status(
    State(state): State<IngestState>,
    publisher: Publisher,
    Query(params): Query<StatusParams>,
) -> Result<Response, AppError> {
    if params.idempotency_key.trim().is_empty() {
        return Err(AppError::Validation(
            "idempotency_key must not be empty".to_string(),
        ));
    }

    let query = GetStatusQuery {
        publisher: publisher.0,
        idempotency_key: params.idempotency_key,
    };

    let response = status::handle(&state.db, query).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

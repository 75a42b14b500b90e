use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use sqlx::PgPool;

use super::commands::{finalize, mark_stale, FinalizeSessionCommand, MarkStaleCommand};
use crate::error::AppError;
use crate::identity::Publisher;

pub fn session_routes() -> Router<PgPool> {
    Router::new()
        .route("/finalize", post(finalize_session))
        .route("/mark-stale", post(mark_session_stale))
}

#[derive(Debug, Deserialize)]
struct SessionRequest {
    idempotency_key: String,
}

#[tracing::instrument(skip(pool, publisher, request), fields(publisher = %publisher))]
async fn finalize_session(
    State(pool): State<PgPool>,
    publisher: Publisher,
    Json(request): Json<SessionRequest>,
) -> Result<Response, AppError> {
    let command = FinalizeSessionCommand {
        publisher: publisher.0,
        idempotency_key: request.idempotency_key,
    };

    let response = finalize::handle(&pool, command).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[tracing::instrument(skip(pool, publisher, request), fields(publisher = %publisher))]
async fn mark_session_stale(
    State(pool): State<PgPool>,
    publisher: Publisher,
    Json(request): Json<SessionRequest>,
) -> Result<Response, AppError> {
    let command = MarkStaleCommand {
        publisher: publisher.0,
        idempotency_key: request.idempotency_key,
    };

    let response = mark_stale::handle(&pool, command).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

//! Feature modules implementing the MIP API
//!
//! Vertical slices, each with its own commands, queries, and routes:
//!
//! - **ingest**: record/batch/NDJSON submission and the resume status query
//! - **sessions**: explicit session lifecycle transitions (finalize, mark-stale)
//!
//! Commands are write operations with per-command validation and error enums;
//! queries are read-only. Handlers are plain async functions called directly
//! from the routes.

pub mod ingest;
pub mod sessions;

use axum::{extract::DefaultBodyLimit, Router};
use sqlx::PgPool;

use crate::config::LimitsConfig;
use crate::db::PgDedupStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool
    pub db: PgPool,
    /// Ingestion payload limits
    pub limits: LimitsConfig,
}

/// State for the ingest slice: pool, dedup store, and limits.
#[derive(Clone)]
pub struct IngestState {
    pub db: PgPool,
    pub store: PgDedupStore,
    pub limits: LimitsConfig,
}

/// Creates the main API router with all feature routes mounted
///
/// - `/submit`: single record, batch, and NDJSON submission
/// - `/ingest`: session status for resumption
/// - `/metrics`: publisher-scoped read-back of stored records
/// - `/sessions`: finalize and mark-stale transitions
pub fn router(state: FeatureState) -> Router<()> {
    let ingest_state = IngestState {
        store: PgDedupStore::new(state.db.clone()),
        db: state.db.clone(),
        limits: state.limits,
    };

    Router::new()
        .nest(
            "/submit",
            ingest::submit_routes()
                .layer(DefaultBodyLimit::max(state.limits.max_body_bytes))
                .with_state(ingest_state.clone()),
        )
        .nest(
            "/ingest",
            ingest::status_routes().with_state(ingest_state.clone()),
        )
        .nest("/metrics", ingest::metrics_routes().with_state(ingest_state))
        .nest("/sessions", sessions::session_routes().with_state(state.db))
}

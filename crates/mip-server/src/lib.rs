//! MIP Server Library
//!
//! HTTP server for idempotent, resumable metric ingestion.
//!
//! # Overview
//!
//! Authorised publishers deliver time-series metric records as single
//! documents, JSON arrays, or (optionally gzipped) NDJSON streams. The server
//! guarantees each record is stored exactly once even when clients crash,
//! retry, resend, or resume mid-transfer:
//!
//! - **Ingestion endpoints**: `/api/v1/submit`, `/submit/batch`, `/submit/ndjson`,
//!   with publisher-scoped read-back at `/metrics/me`
//! - **Session tracker**: durable per-(publisher, idempotency key) progress
//!   with an advisory `next_expected_seq` high-water mark for resumption
//! - **Dedup store**: PostgreSQL uniqueness constraint on
//!   (publisher, idempotency key, seq, record offset); duplicate writes are
//!   no-ops, never errors
//!
//! Authentication is external: an upstream collaborator validates the bearer
//! credential and forwards the resolved identity, which handlers consume via
//! the [`identity::Publisher`] extractor.
//!
//! ## Framework Stack
//!
//! - **Axum**: web framework
//! - **SQLx**: PostgreSQL access and migrations
//! - **Tower / tower-http**: middleware (trace, CORS, compression)

pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod identity;
pub mod middleware;

// Re-export commonly used types
pub use error::{AppError, ServerResult};

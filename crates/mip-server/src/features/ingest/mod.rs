//! Ingestion feature slice
//!
//! Accepts single records, bounded JSON arrays, and (optionally gzipped)
//! NDJSON streams, persisting them through the dedup store so any retry or
//! resend converges to exactly-once storage.

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

#[cfg(test)]
mod routes_test;

pub use routes::{metrics_routes, status_routes, submit_routes};

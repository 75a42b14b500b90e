//! Database access layer
//!
//! - [`store`]: the dedup store capability (write-if-absent metric records)
//! - [`sessions`]: ingest session rows backing the session tracker

pub mod sessions;
pub mod store;

pub use store::{ChunkCommit, DedupStore, PgDedupStore};

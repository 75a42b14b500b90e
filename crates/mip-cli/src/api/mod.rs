//! HTTP client for the ingestion server

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::IngestClient;

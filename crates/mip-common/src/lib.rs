//! MIP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the MIP project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all MIP workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Checksums**: Chunk content hashing for manifest verification
//! - **Logging**: Centralized tracing setup for server and CLI
//! - **Types**: Wire types shared between the ingestion server and the CLI
//!
//! # Example
//!
//! ```no_run
//! use mip_common::{Result, checksum};
//!
//! fn hash_chunk(bytes: &[u8]) -> Result<String> {
//!     Ok(checksum::sha256_hex(bytes))
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{MipError, Result};
pub use types::{IngestAck, SessionStatus, StatusResponse};

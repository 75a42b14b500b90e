//! Write operations for the ingest slice

pub mod submit_chunk;
pub mod submit_record;

pub use submit_chunk::{SubmitChunkCommand, SubmitChunkError};
pub use submit_record::SubmitRecordCommand;

//! Read operations for the ingest slice

pub mod list_records;
pub mod status;

pub use list_records::ListRecordsQuery;
pub use status::GetStatusQuery;

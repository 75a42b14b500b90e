//! Error types for MIP

use thiserror::Error;

/// Result type alias for MIP operations
pub type Result<T> = std::result::Result<T, MipError>;

/// Main error type for MIP
#[derive(Error, Debug)]
pub enum MipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error at record {line}: {message}")]
    ParseAt { line: usize, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Size limit exceeded: {0}")]
    SizeLimitExceeded(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl MipError {
    /// Create a parse error tagged with the offending record (1-based line number)
    pub fn parse_at(line: usize, message: impl Into<String>) -> Self {
        Self::ParseAt {
            line,
            message: message.into(),
        }
    }
}

//! Error types for the MIP CLI
//!
//! All errors are user-facing with clear messages pointing at the next
//! action: fix the input, re-plan, or resume the upload.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Source dataset could not be parsed; planning aborts before any output
    #[error("Parse error: {0}. No chunks or manifest were written; fix the source file and re-run 'mip plan'.")]
    Parse(String),

    /// Server returned a non-duplicate rejection
    #[error("Server rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    /// Upload aborted at a specific chunk after retries were exhausted
    #[error("Upload aborted at chunk seq {seq}: {source}. Re-run with '--auto-resume' (or '--resume-from {seq}') to continue from this point.")]
    UploadAborted {
        seq: u64,
        #[source]
        source: Box<CliError>,
    },

    /// Manifest file has invalid format or content
    #[error("Invalid manifest: {0}. Delete manifest.json and re-run 'mip plan' to regenerate it.")]
    InvalidManifest(String),

    /// Required file is missing
    #[error("File not found: '{0}'. Verify the path exists and you have read permissions.")]
    FileNotFound(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your connection and the endpoint URL.")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your flags or environment variables.")]
    Config(String),

    /// Error from the shared library
    #[error(transparent)]
    Common(#[from] mip_common::MipError),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an API rejection error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid manifest error
    pub fn invalid_manifest(msg: impl Into<String>) -> Self {
        Self::InvalidManifest(msg.into())
    }

    /// Wrap a failure with the chunk seq at which it occurred
    pub fn aborted_at(seq: u64, source: CliError) -> Self {
        Self::UploadAborted {
            seq,
            source: Box::new(source),
        }
    }

    /// Whether this error is worth retrying at the transport level
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

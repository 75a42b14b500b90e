//! MIP CLI Library
//!
//! Command-line interface for planning and uploading metric chunks.
//!
//! # Overview
//!
//! The CLI drives the client half of the idempotent ingestion pipeline:
//!
//! - **Chunk Planning**: split a source dataset into chunk artifacts plus a
//!   manifest (`mip plan`)
//! - **Resumable Upload**: deliver chunks in order with retries and resume
//!   support (`mip upload`)
//! - **Session Status**: inspect server-side upload progress (`mip status`)

pub mod api;
pub mod commands;
pub mod error;
pub mod manifest;
pub mod planner;
pub mod progress;
pub mod retry;
pub mod upload_state;
pub mod uploader;

// Re-export commonly used types
pub use error::{CliError, Result};
pub use manifest::Manifest;
pub use upload_state::UploadState;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MIP - Metric Ingestion Pipeline client
#[derive(Parser, Debug)]
#[command(name = "mip")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to this file instead of the console
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a source dataset into chunk artifacts plus a manifest
    Plan {
        /// Source dataset (JSON array or NDJSON)
        input: PathBuf,

        /// Directory for chunk artifacts and the manifest
        out_dir: PathBuf,

        /// Records per chunk
        #[arg(long, default_value_t = 10_000)]
        chunk_size: usize,

        /// Compress chunk artifacts with gzip
        #[arg(long)]
        gzip: bool,

        /// Source format
        #[arg(long, default_value = "auto", value_parser = ["auto", "array", "ndjson"])]
        input_format: String,

        /// Explicit idempotency key (a fresh uuid is generated when absent)
        #[arg(long)]
        idem_key: Option<String>,

        /// Chunk file name prefix
        #[arg(long, default_value = "chunk")]
        prefix: String,

        /// First chunk sequence number
        #[arg(long, default_value_t = 0)]
        start_seq: u64,
    },

    /// Upload planned chunks to the ingestion server
    Upload {
        /// Directory containing the manifest and chunk artifacts
        out_dir: PathBuf,

        /// Chunk submission URL
        #[arg(
            long,
            env = "MIP_ENDPOINT",
            default_value = "http://localhost:8000/api/v1/submit/ndjson"
        )]
        endpoint: String,

        /// Bearer credential for the Authorization header
        #[arg(long, env = "MIP_BEARER")]
        bearer: String,

        /// Session status URL, required for --auto-resume
        #[arg(long, env = "MIP_STATUS_ENDPOINT")]
        status_endpoint: Option<String>,

        /// Query the session tracker for the resume point before sending
        #[arg(long)]
        auto_resume: bool,

        /// Start from this seq, skipping earlier chunks
        #[arg(long)]
        resume_from: Option<u64>,

        /// Ignore the local progress file when resolving the resume point
        #[arg(long)]
        no_resume_local: bool,

        /// Print equivalent curl commands instead of uploading
        #[arg(long)]
        emit_curl: bool,

        /// Retry attempts per chunk before aborting
        #[arg(long, default_value_t = 5)]
        max_attempts: usize,

        /// Base backoff delay in milliseconds
        #[arg(long, default_value_t = 500)]
        retry_base_ms: u64,
    },

    /// Show server-side session status for an upload
    Status {
        /// Directory containing the manifest (supplies the idempotency key)
        out_dir: Option<PathBuf>,

        /// Idempotency key to query (overrides the manifest)
        #[arg(long)]
        idem_key: Option<String>,

        /// Session status URL
        #[arg(
            long,
            env = "MIP_STATUS_ENDPOINT",
            default_value = "http://localhost:8000/api/v1/ingest/status"
        )]
        status_endpoint: String,

        /// Bearer credential for the Authorization header
        #[arg(long, env = "MIP_BEARER")]
        bearer: String,
    },
}

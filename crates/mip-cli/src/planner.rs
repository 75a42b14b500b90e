//! Chunk planner
//!
//! Splits a source dataset (JSON array or NDJSON) into numbered chunk
//! artifacts plus a manifest. Parsing is all-or-nothing: a malformed record
//! fails the run before any artifact or manifest is written, so an existing
//! manifest can always be trusted for resumption.

use crate::error::{CliError, Result};
use crate::manifest::{ChunkMeta, Manifest, MANIFEST_FILE};
use flate2::write::GzEncoder;
use flate2::Compression;
use mip_common::checksum::sha256_hex;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Input format for the source dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Detect from the first non-whitespace byte
    Auto,
    /// JSON array of records
    Array,
    /// Newline-delimited JSON, one record per line
    Ndjson,
}

impl std::str::FromStr for InputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "array" => Ok(Self::Array),
            "ndjson" => Ok(Self::Ndjson),
            other => Err(CliError::config(format!(
                "unknown input format '{}', expected auto, array, or ndjson",
                other
            ))),
        }
    }
}

/// Settings for one planning run
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Target records per chunk
    pub chunk_size: usize,
    /// Compress chunk artifacts with gzip
    pub gzip: bool,
    /// Source format, or Auto to detect
    pub format: InputFormat,
    /// Explicit idempotency key; a fresh uuid is generated when absent
    pub idem_key: Option<String>,
    /// Chunk file name prefix
    pub prefix: String,
    /// First chunk sequence number
    pub start_seq: u64,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            gzip: false,
            format: InputFormat::Auto,
            idem_key: None,
            prefix: "chunk".to_string(),
            start_seq: 0,
        }
    }
}

/// Plan chunks for `input` into `out_dir`, returning the manifest.
///
/// If `out_dir` already contains a manifest, that run is reused untouched:
/// re-planning would assign a new idempotency key and orphan any progress
/// the server has recorded for the old one.
pub fn plan(input: &Path, out_dir: &Path, options: &PlanOptions) -> Result<Manifest> {
    if options.chunk_size == 0 {
        return Err(CliError::config("--chunk-size must be at least 1"));
    }

    let manifest_path = out_dir.join(MANIFEST_FILE);
    if manifest_path.exists() {
        let existing = Manifest::load(&manifest_path)?;
        tracing::info!(
            idempotency_key = %existing.idempotency_key,
            total_chunks = existing.total_chunks,
            "reusing existing manifest"
        );
        return Ok(existing);
    }

    let source = std::fs::read_to_string(input)
        .map_err(|_| CliError::FileNotFound(input.display().to_string()))?;

    // Parse everything up front; nothing is written until this succeeds.
    let records = parse_source(&source, options.format)?;

    std::fs::create_dir_all(out_dir)?;

    let idempotency_key = options
        .idem_key
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut manifest = Manifest::new(
        idempotency_key,
        options.chunk_size,
        options.gzip,
        options.start_seq,
        input.display().to_string(),
    );

    for (index, batch) in records.chunks(options.chunk_size).enumerate() {
        let seq = options.start_seq + index as u64;
        let meta = write_chunk(out_dir, seq, batch, options)?;
        manifest.push_chunk(meta);
        // Persist after every chunk so a crash leaves a usable prefix.
        manifest.save(&manifest_path)?;
    }

    manifest.save(&manifest_path)?;

    tracing::info!(
        total_chunks = manifest.total_chunks,
        total_records = manifest.total_records,
        "planning complete"
    );
    Ok(manifest)
}

/// Parse the source into records, detecting the format when asked to.
fn parse_source(source: &str, format: InputFormat) -> Result<Vec<Value>> {
    let format = match format {
        InputFormat::Auto => detect_format(source),
        forced => forced,
    };

    match format {
        InputFormat::Array => {
            serde_json::from_str::<Vec<Value>>(source).map_err(|e| CliError::parse(e.to_string()))
        }
        InputFormat::Ndjson => parse_ndjson(source),
        InputFormat::Auto => unreachable!("auto resolved above"),
    }
}

/// A source starting with `[` is a JSON array; anything else is NDJSON.
fn detect_format(source: &str) -> InputFormat {
    match source.trim_start().as_bytes().first() {
        Some(b'[') => InputFormat::Array,
        _ => InputFormat::Ndjson,
    }
}

fn parse_ndjson(source: &str) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for (number, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| CliError::parse(format!("line {}: {}", number + 1, e)))?;
        records.push(value);
    }
    Ok(records)
}

/// Serialize one chunk's records to an artifact file and return its metadata.
///
/// The hash covers the uncompressed NDJSON bytes so it stays comparable
/// across gzip and plain runs of the same source.
fn write_chunk(
    out_dir: &Path,
    seq: u64,
    records: &[Value],
    options: &PlanOptions,
) -> Result<ChunkMeta> {
    let mut ndjson = Vec::new();
    for record in records {
        serde_json::to_writer(&mut ndjson, record)?;
        ndjson.push(b'\n');
    }

    let sha256 = sha256_hex(&ndjson);
    let path = chunk_file_name(&options.prefix, seq, options.gzip);
    let full_path = out_dir.join(&path);

    if options.gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&ndjson)?;
        std::fs::write(&full_path, encoder.finish()?)?;
    } else {
        std::fs::write(&full_path, &ndjson)?;
    }

    let size_bytes = std::fs::metadata(&full_path)?.len();

    Ok(ChunkMeta {
        seq,
        path,
        records: records.len(),
        size_bytes,
        sha256,
        gzip: options.gzip,
    })
}

/// Artifact file name for a chunk seq
pub fn chunk_file_name(prefix: &str, seq: u64, gzip: bool) -> String {
    if gzip {
        format!("{}_{:06}.ndjson.gz", prefix, seq)
    } else {
        format!("{}_{:06}.ndjson", prefix, seq)
    }
}

/// Resolve a chunk artifact to its absolute path
pub fn chunk_path(out_dir: &Path, meta: &ChunkMeta) -> PathBuf {
    out_dir.join(&meta.path)
}

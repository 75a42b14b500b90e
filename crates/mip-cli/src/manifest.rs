//! Manifest file handling (manifest.json)
//!
//! The manifest describes one planning run: the idempotency key scoping the
//! upload, the planner settings, and an ordered descriptor per chunk. It is
//! the contract between `mip plan` and `mip upload`, and is always written
//! atomically so a crash mid-plan never leaves a half-trustworthy manifest.

use crate::error::{CliError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name used for the manifest inside the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Upload manifest (manifest.json)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Idempotency key scoping this upload
    pub idempotency_key: String,

    /// Target records per chunk
    pub chunk_size: usize,

    /// Whether chunk artifacts are gzip-compressed
    pub gzip: bool,

    /// First chunk sequence number
    pub start_seq: u64,

    /// Source file the chunks were planned from
    pub input: String,

    /// When this planning run started
    pub created_at: DateTime<Utc>,

    /// Ordered chunk descriptors
    #[serde(default)]
    pub chunks: Vec<ChunkMeta>,

    /// Total number of chunks
    pub total_chunks: usize,

    /// Total number of records across all chunks
    pub total_records: usize,
}

/// Metadata for one planned chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMeta {
    /// Chunk sequence number
    pub seq: u64,

    /// Artifact file name, relative to the output directory
    pub path: String,

    /// Number of records in the chunk
    pub records: usize,

    /// Size of the artifact file in bytes
    pub size_bytes: u64,

    /// Hex sha256 of the uncompressed NDJSON bytes
    pub sha256: String,

    /// Whether this artifact is gzip-compressed
    pub gzip: bool,
}

impl Manifest {
    /// Create an empty manifest for a new planning run
    pub fn new(
        idempotency_key: String,
        chunk_size: usize,
        gzip: bool,
        start_seq: u64,
        input: String,
    ) -> Self {
        Self {
            idempotency_key,
            chunk_size,
            gzip,
            start_seq,
            input,
            created_at: Utc::now(),
            chunks: Vec::new(),
            total_chunks: 0,
            total_records: 0,
        }
    }

    /// Load a manifest from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&content)
            .map_err(|e| CliError::invalid_manifest(e.to_string()))?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Save the manifest atomically (write to a temp file, then rename)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Append a chunk descriptor and update the totals
    pub fn push_chunk(&mut self, chunk: ChunkMeta) {
        self.total_records += chunk.records;
        self.chunks.push(chunk);
        self.total_chunks = self.chunks.len();
    }

    /// Seq ordering and count consistency checks
    fn validate(&self) -> Result<()> {
        if self.idempotency_key.is_empty() {
            return Err(CliError::invalid_manifest("empty idempotency_key"));
        }
        if self.chunks.len() != self.total_chunks {
            return Err(CliError::invalid_manifest(format!(
                "total_chunks is {} but {} chunk entries are present",
                self.total_chunks,
                self.chunks.len()
            )));
        }
        for (i, chunk) in self.chunks.iter().enumerate() {
            let expected = self.start_seq + i as u64;
            if chunk.seq != expected {
                return Err(CliError::invalid_manifest(format!(
                    "chunk entry {} has seq {} but {} was expected",
                    i, chunk.seq, expected
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn chunk(seq: u64, records: usize) -> ChunkMeta {
        ChunkMeta {
            seq,
            path: format!("chunk_{:06}.ndjson", seq),
            records,
            size_bytes: 42,
            sha256: "deadbeef".to_string(),
            gzip: false,
        }
    }

    #[test]
    fn test_push_chunk_updates_totals() {
        let mut manifest =
            Manifest::new("key".into(), 100, false, 0, "data.json".into());
        manifest.push_chunk(chunk(0, 100));
        manifest.push_chunk(chunk(1, 37));

        assert_eq!(manifest.total_chunks, 2);
        assert_eq!(manifest.total_records, 137);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);

        let mut manifest =
            Manifest::new("key".into(), 100, true, 5, "data.ndjson".into());
        manifest.push_chunk(chunk(5, 100));
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
        // No stray temp file left behind.
        assert!(!dir.path().join("manifest.json.tmp").exists());
    }

    #[test]
    fn test_load_rejects_out_of_order_seqs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);

        let mut manifest =
            Manifest::new("key".into(), 100, false, 0, "data.json".into());
        manifest.push_chunk(chunk(3, 10));
        manifest.save(&path).unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, CliError::InvalidManifest(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Manifest::load("/nonexistent/manifest.json").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }
}

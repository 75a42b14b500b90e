//! Client-local upload progress (progress.json)
//!
//! Advisory bookkeeping only: the server's session tracker remains the
//! source of truth for resumption. This file lets a restarted process skip
//! straight past chunks it already saw acknowledged, even when the status
//! endpoint is unreachable.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name used for upload progress inside the output directory
pub const PROGRESS_FILE: &str = "progress.json";

/// Terminal status of one chunk delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkOutcome {
    Acked,
    Failed,
}

/// One chunk delivery result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkProgress {
    pub seq: u64,
    pub status: ChunkOutcome,
    pub inserted: u64,
    pub duplicate: bool,
    pub at: DateTime<Utc>,
}

/// Per-manifest upload bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadState {
    /// Idempotency key this progress belongs to
    pub idempotency_key: String,

    /// Highest seq the server has acknowledged, if any
    pub last_acked_seq: Option<u64>,

    /// Per-chunk outcomes in delivery order
    #[serde(default)]
    pub chunks: Vec<ChunkProgress>,
}

impl UploadState {
    pub fn new(idempotency_key: String) -> Self {
        Self {
            idempotency_key,
            last_acked_seq: None,
            chunks: Vec::new(),
        }
    }

    /// Load progress from the output directory, if present and matching the
    /// manifest's key. A key mismatch means the progress belongs to a
    /// different planning run and is ignored.
    pub fn load(out_dir: &Path, idempotency_key: &str) -> Result<Option<Self>> {
        let path = Self::path(out_dir);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let state: UploadState = match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable progress file");
                return Ok(None);
            }
        };

        if state.idempotency_key != idempotency_key {
            tracing::warn!(
                found = %state.idempotency_key,
                expected = %idempotency_key,
                "progress file belongs to a different upload, ignoring"
            );
            return Ok(None);
        }

        Ok(Some(state))
    }

    /// Save progress atomically (write to a temp file, then rename)
    pub fn save(&self, out_dir: &Path) -> Result<()> {
        let path = Self::path(out_dir);
        let content = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Record a server acknowledgement for a chunk
    pub fn record_ack(&mut self, seq: u64, inserted: u64, duplicate: bool) {
        self.last_acked_seq = Some(self.last_acked_seq.map_or(seq, |prev| prev.max(seq)));
        self.chunks.push(ChunkProgress {
            seq,
            status: ChunkOutcome::Acked,
            inserted,
            duplicate,
            at: Utc::now(),
        });
    }

    /// Record a terminal failure for a chunk
    pub fn record_failure(&mut self, seq: u64) {
        self.chunks.push(ChunkProgress {
            seq,
            status: ChunkOutcome::Failed,
            inserted: 0,
            duplicate: false,
            at: Utc::now(),
        });
    }

    /// Resume point implied by local progress alone
    pub fn next_seq(&self) -> Option<u64> {
        self.last_acked_seq.map(|seq| seq + 1)
    }

    fn path(out_dir: &Path) -> PathBuf {
        out_dir.join(PROGRESS_FILE)
    }
}

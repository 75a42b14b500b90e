//! Wire types shared between the ingestion server and the CLI
//!
//! These are the JSON shapes that cross the HTTP boundary; both sides
//! serialize/deserialize the same structs so the contract lives in one place.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an ingestion session.
///
/// Transitions: `InProgress -> Complete` (terminal, via client finalize or an
/// administrative action) and `InProgress -> Stale` (administrative only).
/// A stale session never blocks new writes; the next accepted chunk moves it
/// back to `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    Complete,
    Stale,
}

impl SessionStatus {
    /// Database/text representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Complete => "complete",
            SessionStatus::Stale => "stale",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(SessionStatus::InProgress),
            "complete" => Ok(SessionStatus::Complete),
            "stale" => Ok(SessionStatus::Stale),
            other => Err(format!("unknown session status: {}", other)),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement returned by the submit endpoints.
///
/// `duplicate` is only serialized when true, so a first-time commit responds
/// `{"ok":true,"inserted":N,"next_expected_seq":S}` and an idempotent retry
/// responds `{"ok":true,"inserted":0,"duplicate":true,"next_expected_seq":S}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestAck {
    pub ok: bool,

    /// Number of records newly inserted by this request
    pub inserted: u64,

    /// True only when every record of the chunk was already present
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,

    /// Advisory high-water mark: max committed seq + 1 for this session.
    /// Absent for submissions outside a tracked session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_expected_seq: Option<u64>,
}

impl IngestAck {
    /// Ack for a chunk committed inside a tracked session
    pub fn for_chunk(inserted: u64, total: usize, next_expected_seq: u64) -> Self {
        Self {
            ok: true,
            inserted,
            duplicate: total > 0 && inserted == 0,
            next_expected_seq: Some(next_expected_seq),
        }
    }

    /// Ack for an untracked submission (no idempotency headers)
    pub fn untracked(inserted: u64) -> Self {
        Self {
            ok: true,
            inserted,
            duplicate: false,
            next_expected_seq: None,
        }
    }
}

/// Response of the session status query used for resumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: SessionStatus,
    pub next_expected_seq: u64,
}

impl StatusResponse {
    /// Status shape for a session that has no recorded progress yet
    pub fn fresh() -> Self {
        Self {
            status: SessionStatus::InProgress,
            next_expected_seq: 0,
        }
    }
}

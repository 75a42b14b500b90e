//! Wire types specific to the CLI side of the API
//!
//! The acknowledgement and status payloads themselves live in `mip_common`
//! and are shared with the server; only the error envelope is decoded here.

use serde::Deserialize;

/// Server error envelope: `{"ok": false, "error": {"message", "status"}}`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Inner error detail of the envelope
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[allow(dead_code)]
    pub status: u16,
}

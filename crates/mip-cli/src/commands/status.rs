//! `mip status` command implementation
//!
//! Queries the session tracker for one idempotency key. The key can come
//! from a flag or from the manifest of a planned output directory.

use crate::api::IngestClient;
use crate::error::{CliError, Result};
use crate::manifest::{Manifest, MANIFEST_FILE};
use colored::Colorize;
use std::path::PathBuf;

/// Show server-side session status for an upload
pub async fn run(
    out_dir: Option<PathBuf>,
    idem_key: Option<String>,
    status_endpoint: String,
    bearer: String,
) -> Result<()> {
    let idempotency_key = match (idem_key, out_dir) {
        (Some(key), _) => key,
        (None, Some(dir)) => Manifest::load(dir.join(MANIFEST_FILE))?.idempotency_key,
        (None, None) => {
            return Err(CliError::config(
                "provide --idem-key or an output directory with a manifest",
            ))
        }
    };

    let client = IngestClient::new(String::new(), Some(status_endpoint), bearer)?;
    let status = client.fetch_status(&idempotency_key).await?;

    println!("{} Session {}", "→".cyan(), idempotency_key);
    println!("  status: {}", status.status);
    println!("  next expected seq: {}", status.next_expected_seq);

    Ok(())
}

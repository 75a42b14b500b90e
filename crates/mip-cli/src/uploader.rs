//! Upload orchestrator
//!
//! Delivers planned chunks to the ingestion endpoint strictly in seq order,
//! one in flight at a time. Duplicate acknowledgements count as success, so
//! re-running an interrupted upload always converges on the same stored
//! record set. Resume points come from three sources (explicit flag, local
//! progress file, server session status); the server value reflects what is
//! actually durable and takes precedence.

use crate::api::IngestClient;
use crate::error::{CliError, Result};
use crate::manifest::{ChunkMeta, Manifest};
use crate::planner::chunk_path;
use crate::progress;
use crate::retry::{RetryDisposition, RetryError, RetryPolicy};
use crate::upload_state::UploadState;
use colored::Colorize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Settings for one upload run
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Full chunk submission URL
    pub endpoint: String,
    /// Session status URL, enables `--auto-resume`
    pub status_endpoint: Option<String>,
    /// Bearer credential passed through to the server
    pub bearer: String,
    /// Query the session tracker for the resume point
    pub auto_resume: bool,
    /// Explicit resume seq override
    pub resume_from: Option<u64>,
    /// Ignore the local progress file when resolving the resume point
    pub no_resume_local: bool,
    /// Print equivalent curl commands instead of sending anything
    pub emit_curl: bool,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
    /// Draw a progress bar
    pub show_progress: bool,
}

/// Outcome of a completed upload run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Chunks delivered in this run (acked, duplicate or not)
    pub submitted: u64,
    /// Records newly inserted across all delivered chunks
    pub inserted: u64,
    /// Chunks fully deduplicated by the server
    pub duplicates: u64,
    /// Chunks skipped by resume resolution
    pub skipped: u64,
    /// True when the run stopped early at a cancellation request
    pub cancelled: bool,
}

/// Deliver every pending chunk of the manifest in `out_dir`.
///
/// `cancel` is checked between chunks only; an in-flight submission always
/// runs to a terminal outcome before the flag is honored.
pub async fn upload(
    out_dir: &Path,
    manifest: &Manifest,
    options: &UploadOptions,
    cancel: Arc<AtomicBool>,
) -> Result<UploadSummary> {
    if manifest.total_chunks == 0 {
        println!("{} Manifest has no chunks; nothing to upload", "✓".green());
        return Ok(UploadSummary::default());
    }

    if options.emit_curl {
        emit_curl_plan(out_dir, manifest, options);
        return Ok(UploadSummary {
            skipped: manifest.total_chunks as u64,
            ..UploadSummary::default()
        });
    }

    let client = IngestClient::new(
        options.endpoint.clone(),
        options.status_endpoint.clone(),
        options.bearer.clone(),
    )?;

    let mut state = local_state(out_dir, manifest, options)?;
    let resume_seq = resolve_resume_seq(&client, manifest, &state, options).await?;

    let pending: Vec<&ChunkMeta> = manifest
        .chunks
        .iter()
        .filter(|chunk| chunk.seq >= resume_seq)
        .collect();
    let skipped = (manifest.total_chunks - pending.len()) as u64;

    if skipped > 0 {
        println!(
            "{} Resuming from seq {} ({} chunk(s) already committed)",
            "→".cyan(),
            resume_seq,
            skipped
        );
    }

    let bar = options.show_progress.then(|| {
        progress::create_upload_progress(
            pending.len() as u64,
            &format!("Uploading {}", manifest.idempotency_key),
        )
    });

    let mut summary = UploadSummary {
        skipped,
        ..UploadSummary::default()
    };

    for chunk in pending {
        if cancel.load(Ordering::SeqCst) {
            tracing::info!(next_seq = chunk.seq, "cancellation requested, stopping");
            println!(
                "{} Interrupted; progress saved, resume with '--auto-resume'",
                "→".cyan()
            );
            summary.cancelled = true;
            break;
        }

        let ack = match deliver_chunk(&client, out_dir, manifest, chunk, &options.retry).await {
            Ok(ack) => ack,
            Err(err) => {
                state.record_failure(chunk.seq);
                state.save(out_dir)?;
                if let Some(bar) = &bar {
                    bar.abandon();
                }
                return Err(CliError::aborted_at(chunk.seq, err));
            }
        };

        summary.submitted += 1;
        summary.inserted += ack.inserted;
        if ack.duplicate {
            summary.duplicates += 1;
            tracing::debug!(seq = chunk.seq, "chunk already committed server-side");
        }

        state.record_ack(chunk.seq, ack.inserted, ack.duplicate);
        state.save(out_dir)?;

        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }

    if let Some(bar) = &bar {
        bar.finish();
    }

    if !summary.cancelled {
        println!(
            "\n{} Upload complete: {} chunk(s) delivered, {} record(s) inserted, {} duplicate chunk(s)",
            "✓".green().bold(),
            summary.submitted,
            summary.inserted,
            summary.duplicates
        );
    }

    Ok(summary)
}

/// One chunk to terminal resolution: retried on transients, fatal otherwise
async fn deliver_chunk(
    client: &IngestClient,
    out_dir: &Path,
    manifest: &Manifest,
    chunk: &ChunkMeta,
    retry: &RetryPolicy,
) -> Result<mip_common::IngestAck> {
    let path = chunk_path(out_dir, chunk);
    let body = std::fs::read(&path)
        .map_err(|_| CliError::FileNotFound(path.display().to_string()))?;

    // The manifest hash covers the uncompressed bytes, so plain artifacts
    // can be checked against on-disk corruption before anything is sent.
    if !chunk.gzip {
        mip_common::checksum::verify_sha256(&body, &chunk.sha256)?;
    }

    tracing::info!(
        seq = chunk.seq,
        records = chunk.records,
        bytes = body.len(),
        "submitting chunk"
    );

    let result = retry
        .run(
            || {
                client.submit_chunk(
                    &manifest.idempotency_key,
                    chunk.seq,
                    body.clone(),
                    chunk.gzip,
                )
            },
            |err: &CliError| {
                if err.is_transient() {
                    RetryDisposition::Retry
                } else {
                    RetryDisposition::Stop
                }
            },
        )
        .await;

    match result {
        Ok(ack) => Ok(ack),
        Err(RetryError::Fatal(err)) => Err(err),
        Err(RetryError::AttemptsExceeded(err)) => {
            tracing::error!(seq = chunk.seq, error = %err, "retry budget exhausted");
            Err(err)
        }
    }
}

/// Load or initialize the local progress file
fn local_state(
    out_dir: &Path,
    manifest: &Manifest,
    options: &UploadOptions,
) -> Result<UploadState> {
    if options.no_resume_local {
        return Ok(UploadState::new(manifest.idempotency_key.clone()));
    }
    Ok(UploadState::load(out_dir, &manifest.idempotency_key)?
        .unwrap_or_else(|| UploadState::new(manifest.idempotency_key.clone())))
}

/// Resolve the first seq to send.
///
/// Local sources (explicit flag, progress file) are merged by maximum, then
/// the server's `next_expected_seq` is applied the same way. The session
/// tracker never reports a value above what is durably committed, so taking
/// the maximum can only skip chunks whose records are already stored.
async fn resolve_resume_seq(
    client: &IngestClient,
    manifest: &Manifest,
    state: &UploadState,
    options: &UploadOptions,
) -> Result<u64> {
    let mut resume = manifest.start_seq;

    if let Some(explicit) = options.resume_from {
        resume = resume.max(explicit);
    }
    if let Some(local) = state.next_seq() {
        resume = resume.max(local);
    }

    if options.auto_resume {
        if !client.has_status_endpoint() {
            return Err(CliError::config(
                "--auto-resume requires --status-endpoint",
            ));
        }
        let status = client.fetch_status(&manifest.idempotency_key).await?;
        tracing::info!(
            status = %status.status,
            next_expected_seq = status.next_expected_seq,
            "session tracker reported progress"
        );
        resume = resume.max(status.next_expected_seq);
    }

    Ok(resume)
}

/// Print one curl command per chunk without touching the network
fn emit_curl_plan(out_dir: &Path, manifest: &Manifest, options: &UploadOptions) {
    for chunk in &manifest.chunks {
        let path = chunk_path(out_dir, chunk);
        let gzip_header = if chunk.gzip {
            " -H 'Content-Encoding: gzip'"
        } else {
            ""
        };
        println!(
            "curl -X POST '{}' -H 'Authorization: Bearer {}' -H 'Idempotency-Key: {}' -H 'X-Batch-Seq: {}' -H 'Content-Type: application/x-ndjson'{} --data-binary @'{}'",
            options.endpoint,
            options.bearer,
            manifest.idempotency_key,
            chunk.seq,
            gzip_header,
            path.display()
        );
    }
}

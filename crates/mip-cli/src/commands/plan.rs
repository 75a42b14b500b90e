//! `mip plan` command implementation
//!
//! Splits a source dataset into chunk artifacts plus a manifest.

use crate::error::Result;
use crate::planner::{self, PlanOptions};
use crate::progress;
use colored::Colorize;
use std::path::Path;

/// Plan chunks from a source dataset
pub async fn run(input: &Path, out_dir: &Path, options: PlanOptions) -> Result<()> {
    println!("{} Planning chunks from {}...", "→".cyan(), input.display());

    let manifest = planner::plan(input, out_dir, &options)?;

    if manifest.total_chunks == 0 {
        println!(
            "{} Source is empty; wrote a zero-chunk manifest to {}",
            "✓".green(),
            out_dir.display()
        );
        return Ok(());
    }

    let total_bytes: u64 = manifest.chunks.iter().map(|c| c.size_bytes).sum();
    println!(
        "{} Planned {} chunk(s), {} record(s), {} on disk",
        "✓".green(),
        manifest.total_chunks,
        manifest.total_records,
        progress::format_bytes(total_bytes)
    );
    println!("  idempotency key: {}", manifest.idempotency_key);
    println!("  manifest: {}", out_dir.join("manifest.json").display());

    Ok(())
}

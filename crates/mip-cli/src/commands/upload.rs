//! `mip upload` command implementation
//!
//! Delivers every pending chunk of a planned manifest to the server.

use crate::error::Result;
use crate::manifest::{Manifest, MANIFEST_FILE};
use crate::uploader::{self, UploadOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Upload chunks from a planned output directory
pub async fn run(out_dir: &Path, options: UploadOptions) -> Result<()> {
    let manifest = Manifest::load(out_dir.join(MANIFEST_FILE))?;

    // Interrupts are honored between chunks only; the in-flight request
    // always reaches a terminal outcome first.
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::SeqCst);
        }
    });

    uploader::upload(out_dir, &manifest, &options, cancel).await?;
    Ok(())
}

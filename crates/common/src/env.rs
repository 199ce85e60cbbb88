//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{debug, warn};

/// Ensure the data directory exists and is writable.
///
/// Fails when the directory cannot be created or a probe file cannot be
/// written into it; callers treat that as a fatal startup error.
pub async fn ensure_data_dir(data_dir: impl AsRef<Path>) -> anyhow::Result<()> {
    let data_dir = data_dir.as_ref();
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;

    let probe = data_dir.join(".write-probe");
    if let Err(e) = tokio::fs::write(&probe, b"").await {
        warn!(dir = %data_dir.display(), error = %e, "data directory is not writable");
        return Err(anyhow::anyhow!("data directory {} is not writable: {e}", data_dir.display()));
    }
    let _ = tokio::fs::remove_file(&probe).await;
    debug!(dir = %data_dir.display(), "data directory ready");
    Ok(())
}

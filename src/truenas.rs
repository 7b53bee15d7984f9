//! TrueNAS configuration snapshot download.
//!
//! One POST to the TrueNAS `config/save` endpoint, body streamed to a
//! timestamped tar file, followed by retention pruning of old snapshots.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::config::SnapshotConfig;
use crate::retention;
use crate::utils::errors::{BackupError, Result};

/// Download one configuration snapshot and prune old ones.
///
/// Returns the path of the saved snapshot. On a non-200 response the
/// partial file (if any) is removed; a 200 response with an empty body is
/// an integrity error and the empty file is left on disk for inspection.
pub async fn run(cfg: &SnapshotConfig) -> Result<PathBuf> {
    tokio::fs::create_dir_all(&cfg.output_dir).await?;

    let url = format!("http://{}:{}/api/v2.0/config/save", cfg.host, cfg.port);
    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let target = cfg.output_dir.join(format!("{}-{timestamp}.tar", cfg.host));

    info!("Requesting config snapshot from {url}");

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .bearer_auth(&cfg.api_key)
        .header(ACCEPT, "*/*")
        .json(&serde_json::json!({}))
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::OK {
        warn!("Remote returned HTTP {status}, discarding snapshot");
        remove_partial(&target).await;
        return Err(BackupError::UnexpectedStatus(status.as_u16()));
    }

    if let Err(e) = write_body(response, &target).await {
        remove_partial(&target).await;
        return Err(e);
    }

    let size = tokio::fs::metadata(&target)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    if size == 0 {
        // Left on disk for inspection.
        return Err(BackupError::EmptySnapshot(target));
    }

    info!("Saved config snapshot to {} ({size} bytes)", target.display());

    retention::prune(&cfg.output_dir, "tar", cfg.retain);

    Ok(target)
}

/// Stream the response body chunk-wise into the target file.
async fn write_body(response: reqwest::Response, target: &Path) -> Result<()> {
    let mut file = tokio::fs::File::create(target).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;

    Ok(())
}

async fn remove_partial(target: &Path) {
    match tokio::fs::remove_file(target).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial snapshot {}: {e}", target.display()),
    }
}

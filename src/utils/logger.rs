//! Logging configuration using tracing.
//!
//! Every run logs to the console and, when a log file is configured,
//! mirrors the same lines into it (append mode, no ANSI codes).

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the specified level and optional log file.
///
/// A log file that cannot be opened degrades to console-only logging; it
/// never fails the backup run.
pub fn init(level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = log_file.and_then(|path| match open_log_file(path) {
        Ok(file) => Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file))),
        Err(e) => {
            eprintln!(
                "Cannot open log file {}: {e}; logging to console only",
                path.display()
            );
            None
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

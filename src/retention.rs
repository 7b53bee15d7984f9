//! Snapshot retention: keep the newest N matching files, delete the rest.

use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::{error, info, warn};

/// Delete all but the `keep` most recently modified files with the given
/// extension in `dir`.
///
/// Pruning is best-effort and never fails the caller: listing errors and
/// individual deletion failures are logged and skipped. Candidates are
/// ordered newest-first by mtime, ties broken by path so the outcome is
/// deterministic.
pub fn prune(dir: &Path, extension: &str, keep: usize) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Cannot list {} for pruning: {e}", dir.display());
            return;
        }
    };

    let mut snapshots: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == extension)
                .unwrap_or(false)
        })
        .map(|e| {
            let modified = e
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(UNIX_EPOCH);
            (e.path(), modified)
        })
        .collect();

    if snapshots.len() <= keep {
        info!(
            "Nothing to prune in {} ({} of {} snapshots kept)",
            dir.display(),
            snapshots.len(),
            keep
        );
        return;
    }

    snapshots.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    for (path, _) in snapshots.into_iter().skip(keep) {
        match std::fs::remove_file(&path) {
            Ok(()) => info!("Removed old snapshot: {}", path.display()),
            Err(e) => warn!("Failed to remove old snapshot {}: {e}", path.display()),
        }
    }
}

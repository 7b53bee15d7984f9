//! Proxmox host configuration backup.
//!
//! Delegates the actual encoding and transport to proxmox-backup-client;
//! this module only computes the arguments, runs the client once and
//! reports its exit status. No retries — a transient failure is surfaced
//! to the invoking scheduler.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{error, info};

use crate::config::PbsJobConfig;
use crate::utils::errors::{BackupError, Result};

const BACKUP_ID_PREFIX: &str = "config";

/// Run a single host configuration backup.
///
/// Preconditions (checked before anything is executed): the backup client
/// must be resolvable. Repository and password are already validated at
/// config construction.
pub async fn run(cfg: &PbsJobConfig) -> Result<()> {
    let client_bin = resolve_client(&cfg.client_bin)
        .ok_or_else(|| BackupError::ClientMissing(cfg.client_bin.clone()))?;

    let date = chrono::Local::now().format("%Y%m%d").to_string();
    let archives = archive_args(&cfg.source_paths, &date);
    let backup_id = format!("{BACKUP_ID_PREFIX}-{}", cfg.host_id);

    info!(
        "Backing up {} archive(s) to {} (backup-id: {})",
        archives.len(),
        cfg.repository,
        backup_id
    );

    // The password goes through the child's environment only.
    let status = Command::new(&client_bin)
        .arg("backup")
        .args(&archives)
        .arg("--repository")
        .arg(&cfg.repository)
        .arg("--backup-id")
        .arg(&backup_id)
        .env("PBS_PASSWORD", &cfg.password)
        .status()
        .await?;

    if !status.success() {
        error!("Backup client failed: {status}");
        return Err(BackupError::ClientFailed(status));
    }

    info!("Host configuration backup finished");
    Ok(())
}

/// One client argument per source path: `label-YYYYMMDD.pxar:path`.
fn archive_args(source_paths: &[(String, PathBuf)], date: &str) -> Vec<String> {
    source_paths
        .iter()
        .map(|(label, path)| format!("{label}-{date}.pxar:{}", path.display()))
        .collect()
}

/// Resolve the client binary: names are searched on PATH, anything
/// containing a separator is taken as a path and checked directly.
fn resolve_client(name: &str) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(name);
        return is_executable(&candidate).then_some(candidate);
    }

    std::env::split_paths(&std::env::var_os("PATH")?)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Writes a stand-in client script that records its argv and exits
    /// with the given code.
    fn fake_client(dir: &Path, exit_code: i32) -> PathBuf {
        let path = dir.join("fake-backup-client");
        let script = format!(
            "#!/bin/sh\necho \"$@\" > {}/args.txt\nexit {}\n",
            dir.display(),
            exit_code
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn test_config(client_bin: &Path) -> PbsJobConfig {
        PbsJobConfig {
            repository: "backup@pbs@pbs01:config-store".to_string(),
            password: "secret".to_string(),
            host_id: "pve1".to_string(),
            client_bin: client_bin.display().to_string(),
            source_paths: vec![("pve-conf".to_string(), PathBuf::from("/etc/pve"))],
        }
    }

    #[test]
    fn test_archive_arg_formatting() {
        let paths = vec![
            ("pve-conf".to_string(), PathBuf::from("/etc/pve")),
            ("cron".to_string(), PathBuf::from("/var/spool/cron")),
        ];
        assert_eq!(
            archive_args(&paths, "20260830"),
            vec![
                "pve-conf-20260830.pxar:/etc/pve".to_string(),
                "cron-20260830.pxar:/var/spool/cron".to_string(),
            ]
        );
    }

    #[test]
    fn test_resolve_client_finds_sh_on_path() {
        assert!(resolve_client("sh").is_some());
    }

    #[test]
    fn test_resolve_client_rejects_missing_binary() {
        assert!(resolve_client("definitely-not-a-real-backup-client").is_none());
    }

    #[tokio::test]
    async fn test_run_passes_computed_arguments() {
        let temp_dir = TempDir::new().unwrap();
        let client = fake_client(temp_dir.path(), 0);
        let cfg = test_config(&client);

        run(&cfg).await.unwrap();

        let args = std::fs::read_to_string(temp_dir.path().join("args.txt")).unwrap();
        assert!(args.starts_with("backup "));
        assert!(args.contains(".pxar:/etc/pve"));
        assert!(args.contains("pve-conf-"));
        assert!(args.contains("--repository backup@pbs@pbs01:config-store"));
        assert!(args.contains("--backup-id config-pve1"));
    }

    #[tokio::test]
    async fn test_run_surfaces_client_failure() {
        let temp_dir = TempDir::new().unwrap();
        let client = fake_client(temp_dir.path(), 1);
        let cfg = test_config(&client);

        let err = run(&cfg).await.unwrap_err();
        assert!(matches!(err, BackupError::ClientFailed(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_run_aborts_when_client_is_missing() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = test_config(&temp_dir.path().join("does-not-exist"));
        cfg.client_bin = "definitely-not-a-real-backup-client".to_string();

        let err = run(&cfg).await.unwrap_err();
        assert!(matches!(err, BackupError::ClientMissing(_)));
        assert_eq!(err.exit_code(), 1);
    }
}

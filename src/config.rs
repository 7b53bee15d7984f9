//! Environment-driven configuration for both backup workflows.
//!
//! Each workflow reads its settings once at process start; the resulting
//! config is immutable for the rest of the run. Constructors take a
//! lookup closure so tests can inject variables without touching the
//! process environment.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::errors::{BackupError, Result};

pub const DEFAULT_TRUENAS_PORT: u16 = 80;
pub const DEFAULT_RETAIN: usize = 30;

const DEFAULT_CLIENT: &str = "proxmox-backup-client";
const DEFAULT_SOURCE_PATHS: &str = "pve-conf:/etc/pve";

/// Settings for the Proxmox host configuration backup.
#[derive(Clone)]
pub struct PbsJobConfig {
    /// Repository target, e.g. `user@pbs@host:datastore`
    pub repository: String,

    /// Repository password; passed to the client via its environment,
    /// never logged
    pub password: String,

    /// Hostname used to derive the backup identifier
    pub host_id: String,

    /// Backup client binary (name resolved on PATH, or a full path)
    pub client_bin: String,

    /// Ordered (label, path) pairs to archive
    pub source_paths: Vec<(String, PathBuf)>,
}

impl PbsJobConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let repository = require(&get, "PBS_REPOSITORY")?;
        let password = require(&get, "PBS_PASSWORD")?;

        let host_id = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());

        let client_bin = get("PBS_CLIENT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT.to_string());

        let raw_paths = get("PBS_SOURCE_PATHS")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE_PATHS.to_string());
        let source_paths = parse_source_paths(&raw_paths)?;

        Ok(Self {
            repository,
            password,
            host_id,
            client_bin,
            source_paths,
        })
    }
}

impl fmt::Debug for PbsJobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PbsJobConfig")
            .field("repository", &self.repository)
            .field("password", &"<redacted>")
            .field("host_id", &self.host_id)
            .field("client_bin", &self.client_bin)
            .field("source_paths", &self.source_paths)
            .finish()
    }
}

/// Settings for the TrueNAS configuration snapshot download.
#[derive(Clone)]
pub struct SnapshotConfig {
    pub host: String,
    pub port: u16,

    /// API key sent as a bearer token, never logged
    pub api_key: String,

    /// Directory snapshots are written to (created if missing)
    pub output_dir: PathBuf,

    /// Maximum number of snapshot files to keep
    pub retain: usize,
}

impl SnapshotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = require(&get, "TRUENAS_HOST")?;
        let api_key = require(&get, "TRUENAS_API_KEY")?;
        let output_dir = PathBuf::from(require(&get, "BACKUP_DIR")?);
        let port = parse_or(&get, "TRUENAS_PORT", DEFAULT_TRUENAS_PORT)?;
        let retain = parse_or(&get, "BACKUP_RETAIN", DEFAULT_RETAIN)?;

        if retain == 0 {
            return Err(BackupError::Config(
                "BACKUP_RETAIN must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            api_key,
            output_dir,
            retain,
        })
    }
}

impl fmt::Debug for SnapshotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("output_dir", &self.output_dir)
            .field("retain", &self.retain)
            .finish()
    }
}

fn require(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BackupError::Config(format!("{key} is required")))
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match get(key).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| BackupError::Config(format!("{key} must be a number, got '{raw}'"))),
    }
}

fn parse_source_paths(raw: &str) -> Result<Vec<(String, PathBuf)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (label, path) = entry.split_once(':').ok_or_else(|| {
                BackupError::Config(format!(
                    "Invalid source path entry '{entry}', expected label:path"
                ))
            })?;
            if label.is_empty() || path.is_empty() {
                return Err(BackupError::Config(format!(
                    "Invalid source path entry '{entry}', expected label:path"
                )));
            }
            Ok((label.to_string(), PathBuf::from(path)))
        })
        .collect()
}

//! Custom error types for the backup agent.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backup client not found on PATH: {0}")]
    ClientMissing(String),

    #[error("Backup client failed: {0}")]
    ClientFailed(ExitStatus),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote returned HTTP {0}")]
    UnexpectedStatus(u16),

    #[error("Snapshot {} is empty or missing", .0.display())]
    EmptySnapshot(PathBuf),
}

impl BackupError {
    /// Process exit code for this error: 1 for configuration and local
    /// failures, 2 for transport failures, 3 for an invalid payload.
    pub fn exit_code(&self) -> u8 {
        match self {
            BackupError::Config(_)
            | BackupError::Io(_)
            | BackupError::ClientMissing(_)
            | BackupError::ClientFailed(_) => 1,
            BackupError::Http(_) | BackupError::UnexpectedStatus(_) => 2,
            BackupError::EmptySnapshot(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;

//! Configuration Backup Agent
//!
//! Backs up Proxmox host configuration via proxmox-backup-client and
//! TrueNAS configuration snapshots via the TrueNAS REST API.

pub mod config;
pub mod proxmox;
pub mod retention;
pub mod truenas;
pub mod utils;

// Re-export commonly used types
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;

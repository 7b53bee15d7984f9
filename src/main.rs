//! Configuration Backup Agent - Main entry point
//!
//! One invocation runs exactly one backup workflow; scheduling and
//! retries are left to the caller (cron, systemd timers).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use config_backup_agent::config::{PbsJobConfig, SnapshotConfig};
use config_backup_agent::{proxmox, truenas, utils};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log file path (in addition to the console)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log to the console only
    #[arg(long)]
    no_log_file: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Back up the Proxmox host configuration via proxmox-backup-client
    Proxmox,

    /// Download a TrueNAS config snapshot and prune old ones
    Truenas,
}

impl Command {
    fn default_log_file(&self) -> PathBuf {
        let name = match self {
            Command::Proxmox => "proxmox.log",
            Command::Truenas => "truenas.log",
        };
        PathBuf::from("/var/log/config-backup").join(name)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let log_file = if args.no_log_file {
        None
    } else {
        Some(
            args.log_file
                .clone()
                .unwrap_or_else(|| args.command.default_log_file()),
        )
    };

    if let Err(e) = utils::logger::init(&args.log_level, log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(1);
    }

    tracing::info!(
        "Starting config-backup v{} ({:?})",
        env!("CARGO_PKG_VERSION"),
        args.command
    );

    let result = match args.command {
        Command::Proxmox => match PbsJobConfig::from_env() {
            Ok(cfg) => proxmox::run(&cfg).await,
            Err(e) => Err(e),
        },
        Command::Truenas => match SnapshotConfig::from_env() {
            Ok(cfg) => truenas::run(&cfg).await.map(|_| ()),
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

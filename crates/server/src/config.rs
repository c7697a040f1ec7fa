//! Server configuration

use clap::Parser;
use shoal_durability::SyncMode;
use std::path::PathBuf;

/// Command line configuration for the shoal server
#[derive(Debug, Clone, Parser)]
#[command(name = "shoal-server")]
#[command(about = "Typed key-value store with a Redis-style text protocol and WAL recovery")]
#[command(version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 6379)]
    pub port: u16,

    /// Path of the write-ahead log
    #[arg(long, default_value = "wal.log")]
    pub wal_path: PathBuf,

    /// Fsync the WAL after every record instead of trusting the OS
    #[arg(long)]
    pub fsync: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Sync mode implied by the --fsync flag
    pub fn sync_mode(&self) -> SyncMode {
        if self.fsync {
            SyncMode::Always
        } else {
            SyncMode::OsBuffered
        }
    }

    /// host:port to bind
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

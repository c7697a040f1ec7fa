//! shoal server binary
//!
//! Opens the WAL, replays it into a fresh store, then serves clients
//! on a single-threaded cooperative runtime until ctrl-c.

use anyhow::Context;
use clap::Parser;
use shoal_durability::Wal;
use shoal_engine::Store;
use shoal_server::{serve, Config};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    let local = tokio::task::LocalSet::new();
    runtime.block_on(local.run_until(run(config)))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let wal = Wal::open(&config.wal_path, config.sync_mode())
        .with_context(|| format!("failed to open WAL at {}", config.wal_path.display()))?;
    let store = Arc::new(Store::open(wal).context("WAL replay failed")?);
    info!(
        keys = store.len(),
        wal = %config.wal_path.display(),
        mode = config.sync_mode().description(),
        "store ready"
    );

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    info!(addr = %config.listen_addr(), "listening");

    tokio::select! {
        result = serve(listener, Arc::clone(&store)) => {
            result.context("accept loop failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }

    store.wal().close()?;
    Ok(())
}

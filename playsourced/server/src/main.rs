mod config;
mod rpc;
mod server;
mod services;
mod signal_handler;
#[cfg(unix)]
mod systemd;

use clap::Parser;
use eyre::Result;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Args, Config};
use crate::signal_handler::platform::SignalHandler;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let service_mode = args.service_mode;
    let config = Config::load(&args)?;

    let (shutdown_tx, _) = broadcast::channel(32);
    let signal_handler = SignalHandler::start(shutdown_tx.clone())?;

    if service_mode {
        info!("Waiting for mopidy...");
        server::wait_for_mopidy(&config).await;
        notify_ready();
    }

    server::run(config, shutdown_tx).await?;

    if service_mode {
        notify_stopping();
    }
    signal_handler.close().await?;

    Ok(())
}

#[cfg(unix)]
fn notify_ready() {
    if let Err(e) = systemd::notify_ready() {
        tracing::warn!("Error notifying systemd of readiness: {e}");
    }
}

#[cfg(unix)]
fn notify_stopping() {
    if let Err(e) = systemd::notify_stopping() {
        tracing::warn!("Error notifying systemd of shutdown: {e}");
    }
}

#[cfg(not(unix))]
fn notify_ready() {}

#[cfg(not(unix))]
fn notify_stopping() {}

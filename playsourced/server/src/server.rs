use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use libplaysource_player::playsource_player::{
    EmulatedBackend, EmulatedSettings, MopidyBackend, MopidyClient, MopidySettings, SourceBackend,
};
use tokio::sync::broadcast;
use tonic::transport::Server;
use tracing::info;

use crate::config::Config;
use crate::rpc;
use crate::rpc::v1::play_source_server::PlaySourceServer;
use crate::services::play_source::PlaySourceImpl;

// What the emulated source advertised in the original deployment.
const EMULATED_FOUND_PROBABILITY: f64 = 0.9;

pub async fn run(config: Config, shutdown_tx: broadcast::Sender<()>) -> Result<()> {
    // Clients are expected to be local, so bind to loopback only.
    let addr: SocketAddr = format!("127.0.0.1:{}", config.port)
        .parse()
        .wrap_err("Error parsing listen address")?;

    if config.test {
        let backend = EmulatedBackend::new(EmulatedSettings {
            max_queue_size: config.queue_size,
            found_probability: EMULATED_FOUND_PROBABILITY,
            ..Default::default()
        });
        serve(backend, addr, shutdown_tx).await
    } else {
        let backend = MopidyBackend::new(
            MopidyClient::new(config.mopidy_url.clone()),
            MopidySettings {
                max_queue_size: config.queue_size,
                poll_interval: Duration::from_secs(config.poll_interval),
            },
        );
        serve(backend, addr, shutdown_tx).await
    }
}

async fn serve<B: SourceBackend>(
    backend: B,
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<()> {
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(rpc::FILE_DESCRIPTOR_SET)
        .build_v1()
        .wrap_err("Error building reflection service")?;

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<PlaySourceServer<PlaySourceImpl<B>>>()
        .await;

    let play_source = PlaySourceImpl::new(Arc::new(backend));

    let mut shutdown_rx = shutdown_tx.subscribe();
    info!("Listening on {addr}");
    Server::builder()
        .add_service(reflection_service)
        .add_service(health_service)
        .add_service(PlaySourceServer::new(play_source))
        .serve_with_shutdown(addr, async {
            shutdown_rx.recv().await.unwrap_or_default()
        })
        .await
        .wrap_err("Error running server")
}

/// Blocks until the configured mopidy endpoint answers an RPC.
pub async fn wait_for_mopidy(config: &Config) {
    let client = MopidyClient::new(config.mopidy_url.clone());
    while client.current_state().await.is_err() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

pub use tonic::transport::{Channel, Endpoint, Uri};

pub mod v1 {
    tonic::include_proto!("playsource.v1");
}

pub use v1::play_source_client::PlaySourceClient;

/// Connects to a playsource daemon over TCP.
pub async fn connect(
    host: &str,
    port: u16,
) -> Result<PlaySourceClient<Channel>, tonic::transport::Error> {
    let channel = Endpoint::try_from(format!("http://{host}:{port}"))?
        .connect()
        .await?;

    Ok(PlaySourceClient::new(channel))
}

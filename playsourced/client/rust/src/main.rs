use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use playsourced_client::v1::{QueueSongRequest, Song};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "Stream a file of songs into a playsource daemon")]
struct Args {
    /// Hostname of the service
    #[arg(long, default_value = "localhost")]
    hostname: String,

    /// Port of the service
    #[arg(long, default_value_t = 50052)]
    port: u16,

    /// File containing the queue of songs
    #[arg(long, default_value = "sample_queue.json")]
    file: PathBuf,

    /// Number of songs to keep in flight
    #[arg(long, default_value_t = 3)]
    queue_size: usize,
}

#[derive(Debug, Deserialize)]
struct QueueEntry {
    name: String,
    #[serde(default)]
    artists: Vec<String>,
    #[serde(default)]
    genre: String,
}

fn parse_queue(contents: &str) -> Result<Vec<QueueEntry>> {
    serde_json::from_str(contents).wrap_err("Error parsing queue file")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let contents = fs::read_to_string(&args.file)
        .wrap_err_with(|| format!("Error reading queue file {:?}", args.file))?;
    let songs = parse_queue(&contents)?;

    let mut client = playsourced_client::connect(&args.hostname, args.port)
        .await
        .wrap_err("Error connecting to playsource")?;

    let window = args.queue_size.max(1);
    let (tx, rx) = mpsc::channel(window);
    let mut responses = client
        .queue_song(ReceiverStream::new(rx))
        .await?
        .into_inner();

    // Keep up to `window` requests outstanding; every song eventually gets
    // exactly one response (a rejection or a finished notification).
    let mut in_flight = 0usize;
    let mut next = 0usize;
    while next < songs.len() || in_flight > 0 {
        while next < songs.len() && in_flight < window {
            let entry = &songs[next];
            info!("Queueing song: {}", entry.name);
            tx.send(QueueSongRequest {
                song: Some(Song {
                    song_id: next as i32,
                    name: entry.name.clone(),
                    artists: entry.artists.clone(),
                    genre: entry.genre.clone(),
                }),
            })
            .await
            .wrap_err("Error sending queue request")?;

            next += 1;
            in_flight += 1;
        }

        let Some(response) = responses.message().await? else {
            warn!("Server closed the queue stream early");
            break;
        };

        in_flight = in_flight.saturating_sub(1);
        let Some(entry) = songs.get(response.song_id as usize) else {
            warn!("Response for unknown song id {}", response.song_id);
            continue;
        };

        if response.finished {
            info!("Finished: {}", entry.name);
        } else if !response.found {
            warn!("Not found: {}", entry.name);
        } else if !response.queued {
            warn!("Not queued (possible overqueue?): {}", entry.name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_queue_file() {
        let contents = r#"[
            { "name": "Bangarang", "artists": ["Skrillex"], "genre": "Dubstep" },
            { "name": "One More Time", "artists": ["Daft Punk"] }
        ]"#;
        let songs = parse_queue(contents).unwrap();
        assert_eq!(2, songs.len());
        assert_eq!("Bangarang", songs[0].name);
        assert_eq!(vec!["Skrillex".to_owned()], songs[0].artists);
        assert_eq!("", songs[1].genre);
    }

    #[test]
    fn test_parse_queue_rejects_invalid_json() {
        assert!(parse_queue("not json").is_err());
    }
}

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Parser)]
#[command(version, about = "Crowd-driven playback endpoint")]
pub struct Args {
    /// Configuration path; overrides the other flags when set
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Mopidy RPC endpoint
    #[arg(
        long,
        env = "PLAYSOURCE_MOPIDY_URL",
        default_value = "http://localhost:6680/mopidy/rpc"
    )]
    pub mopidy_url: String,

    /// Port to listen on
    #[arg(long, env = "PLAYSOURCE_PORT", default_value_t = 50052)]
    pub port: u16,

    /// Anticipated client queue size
    #[arg(long, env = "PLAYSOURCE_QUEUE_SIZE", default_value_t = 200)]
    pub queue_size: usize,

    /// Mopidy poll time in seconds
    #[arg(long, env = "PLAYSOURCE_POLL_INTERVAL", default_value_t = 10)]
    pub poll_interval: u64,

    /// Emulate a real playsource instead of connecting to mopidy
    #[arg(long)]
    pub test: bool,

    /// Wait for mopidy and signal readiness to systemd before serving
    #[arg(long)]
    pub service_mode: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub mopidy_url: String,
    pub port: u16,
    pub queue_size: usize,
    pub poll_interval: u64,
    #[serde(default)]
    pub test: bool,
}

impl Config {
    pub fn load(args: &Args) -> Result<Self> {
        match &args.config {
            Some(path) => {
                let file = File::open(path)
                    .wrap_err_with(|| format!("Error opening config file {path:?}"))?;
                serde_json::from_reader(file)
                    .wrap_err_with(|| format!("Error parsing config file {path:?}"))
            }
            None => Ok(Self {
                mopidy_url: args.mopidy_url.clone(),
                port: args.port,
                queue_size: args.queue_size,
                poll_interval: args.poll_interval,
                test: args.test,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_load_from_flags() {
        let args = Args::try_parse_from(["playsourced", "--port", "50053", "--test"]).unwrap();
        let config = Config::load(&args).unwrap();

        assert_eq!("http://localhost:6680/mopidy/rpc", config.mopidy_url);
        assert_eq!(50053, config.port);
        assert_eq!(200, config.queue_size);
        assert_eq!(10, config.poll_interval);
        assert!(config.test);
    }

    #[test]
    fn test_config_file_overrides_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "mopidy_url": "http://music.local:6680/mopidy/rpc",
                "port": 9000,
                "queue_size": 5,
                "poll_interval": 2
            }}"#
        )
        .unwrap();

        let args = Args::try_parse_from([
            "playsourced",
            "--config",
            file.path().to_str().unwrap(),
            "--port",
            "50053",
        ])
        .unwrap();
        let config = Config::load(&args).unwrap();

        assert_eq!("http://music.local:6680/mopidy/rpc", config.mopidy_url);
        assert_eq!(9000, config.port);
        assert_eq!(5, config.queue_size);
        assert_eq!(2, config.poll_interval);
        assert!(!config.test);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args =
            Args::try_parse_from(["playsourced", "--config", "/nonexistent/config.json"]).unwrap();
        assert!(Config::load(&args).is_err());
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MopidyError {
    #[error("error communicating with mopidy: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("error decoding mopidy response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mopidy rpc error: code = {code}, message = {message}")]
    Rpc { code: i64, message: String },
}

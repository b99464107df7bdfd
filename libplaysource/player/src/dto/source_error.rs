use thiserror::Error;

use crate::mopidy::error::MopidyError;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The queue channel was closed on the other end.
    #[error("queue provider disconnected")]
    Disconnected,
    #[error("error writing diagnostic output: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Mopidy(#[from] MopidyError),
    #[error("operation not supported by this source: {0}")]
    Unsupported(&'static str),
}

mod backend;
mod dto;
mod emulated;
mod mopidy;
mod pacer;
mod play_source;
mod provider;
mod session;

pub mod playsource_player {
    pub use crate::backend::{QueueOutcome, SourceBackend, SourceSession};
    pub use crate::dto::song::Song;
    pub use crate::dto::source_error::SourceError;
    pub use crate::emulated::{EmulatedBackend, EmulatedSession, EmulatedSettings};
    pub use crate::mopidy::client::MopidyClient;
    pub use crate::mopidy::error::MopidyError;
    pub use crate::mopidy::models::{Artist, PlaybackState, SearchQuery, SearchResult, Track};
    pub use crate::pacer::{Pacer, ThreadPacer};
    pub use crate::play_source::{DEFAULT_TRACK_PAUSE, PlaySource};
    pub use crate::provider::QueueProvider;
    pub use crate::session::{MopidyBackend, MopidySession, MopidySettings};
}

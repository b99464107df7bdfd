use async_trait::async_trait;

use crate::dto::song::Song;
use crate::dto::source_error::SourceError;

/// Result of asking a source to queue one song.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueOutcome {
    /// The song was found and queued for playback.
    Queued,
    /// No playable track matched the request.
    NotFound,
    /// The song was found but the queue is at capacity.
    Rejected,
}

/// A playback source the server can drive. Long-lived; owns now-playing and
/// history state. Query operations work whether or not a master is connected.
#[async_trait]
pub trait SourceBackend: Send + Sync + 'static {
    type Session: SourceSession;

    /// Establishes a control session for a newly connected master, resetting
    /// any state left over from the previous one.
    async fn connect(&self) -> Result<Self::Session, SourceError>;

    /// Skips the currently playing track.
    async fn skip(&self) -> Result<(), SourceError>;

    fn now_playing(&self) -> Option<Song>;

    fn play_history(&self) -> Vec<Song>;
}

/// Per-master-connection control handle. Dropping the session tears down any
/// monitoring it started.
#[async_trait]
pub trait SourceSession: Send + 'static {
    async fn queue_song(&mut self, song: Song) -> Result<QueueOutcome, SourceError>;

    /// Channel of songs that finished playing since they were queued on this
    /// session.
    fn finished_songs(&self) -> flume::Receiver<Song>;
}

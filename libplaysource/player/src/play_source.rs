use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::dto::source_error::SourceError;
use crate::pacer::Pacer;
use crate::provider::QueueProvider;

/// How long each entry is "played" before it is acknowledged.
pub const DEFAULT_TRACK_PAUSE: Duration = Duration::from_secs(5);

/// Drives playback of a fetched queue snapshot, one entry at a time, with an
/// acknowledgment back to the provider after each entry.
///
/// The provider is shared, the pacing source and diagnostic writer are
/// injected. Processing is sequential and blocking; `run` is meant to be
/// called from a dedicated thread.
pub struct PlaySource<P, T, W> {
    provider: Arc<P>,
    pacer: T,
    out: W,
    track_pause: Duration,
}

impl<P, T, W> PlaySource<P, T, W>
where
    P: QueueProvider,
    T: Pacer,
    W: Write,
{
    pub fn new(provider: Arc<P>, pacer: T, out: W, track_pause: Duration) -> Self {
        Self {
            provider,
            pacer,
            out,
            track_pause,
        }
    }

    /// Fetches the current queue snapshot and plays it to exhaustion.
    ///
    /// For each entry, in queue order: emit one `Playing:` line, pace for the
    /// track interval, then acknowledge the entry. An empty snapshot completes
    /// immediately. The snapshot is not refreshed mid-iteration.
    pub fn run(&mut self) -> Result<(), SourceError> {
        let queue = self.provider.queue()?;
        info!("Fetched queue snapshot of {} songs", queue.len());

        for song in &queue {
            writeln!(self.out, "Playing: {song}")?;
            self.out.flush()?;

            self.pacer.pace(self.track_pause);

            self.provider.song_finished();
        }

        Ok(())
    }
}

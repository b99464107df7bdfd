use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{error, warn};

use crate::dto::song::Song;
use crate::dto::source_error::SourceError;
use crate::dto::source_state::SourceState;

/// External queue collaborator: supplies the ordered snapshot of songs to
/// play and accepts one completion acknowledgment per entry.
pub trait QueueProvider {
    /// Returns the current queue snapshot, in queue order.
    fn queue(&self) -> Result<Vec<Song>, SourceError>;

    /// Acknowledges that the entry currently playing finished.
    fn song_finished(&self);
}

/// Adapts a channel of queued songs into a [`QueueProvider`].
///
/// `queue` blocks until at least one song is available, then drains whatever
/// else is already queued into the same snapshot. Acknowledgments retire the
/// snapshot front-to-back, publishing each finished song and rolling the
/// now-playing entry forward.
pub struct ChannelQueue {
    queue_rx: flume::Receiver<Song>,
    finished_tx: flume::Sender<Song>,
    snapshot: Mutex<VecDeque<Song>>,
    state: Arc<Mutex<SourceState>>,
    in_flight: Arc<AtomicUsize>,
}

impl ChannelQueue {
    pub(crate) fn new(
        queue_rx: flume::Receiver<Song>,
        finished_tx: flume::Sender<Song>,
        state: Arc<Mutex<SourceState>>,
        in_flight: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            queue_rx,
            finished_tx,
            snapshot: Mutex::new(VecDeque::new()),
            state,
            in_flight,
        }
    }
}

impl QueueProvider for ChannelQueue {
    fn queue(&self) -> Result<Vec<Song>, SourceError> {
        let first = self
            .queue_rx
            .recv()
            .map_err(|_| SourceError::Disconnected)?;

        let mut songs = vec![first];
        songs.extend(self.queue_rx.try_iter());

        let mut snapshot = self.snapshot.lock().expect("snapshot lock poisoned");
        *snapshot = songs.iter().cloned().collect();

        let mut state = self.state.lock().expect("state lock poisoned");
        state.now_playing = Some(songs[0].clone());

        Ok(songs)
    }

    fn song_finished(&self) {
        let song = {
            let mut snapshot = self.snapshot.lock().expect("snapshot lock poisoned");
            let Some(song) = snapshot.pop_front() else {
                warn!("Received acknowledgment with no entry pending");
                return;
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let mut state = self.state.lock().expect("state lock poisoned");
            state.now_playing = snapshot.front().cloned();
            state.history.push(song.clone());
            song
        };

        if self.finished_tx.send(song).is_err() {
            error!("Finished channel disconnected, dropping acknowledgment");
        }
    }
}

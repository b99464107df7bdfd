use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::{QueueOutcome, SourceBackend, SourceSession};
use crate::dto::song::Song;
use crate::dto::source_error::SourceError;
use crate::dto::source_state::SourceState;
use crate::mopidy::client::MopidyClient;
use crate::mopidy::models::{PlaybackState, SearchQuery};

#[derive(Clone, Debug)]
pub struct MopidySettings {
    pub max_queue_size: usize,
    pub poll_interval: Duration,
}

impl Default for MopidySettings {
    fn default() -> Self {
        Self {
            max_queue_size: 200,
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Playback source backed by a Mopidy server. Songs are resolved through
/// Mopidy's library search and appended to its tracklist; completions are
/// detected by watching the play history grow.
pub struct MopidyBackend {
    client: Arc<MopidyClient>,
    settings: MopidySettings,
    state: Arc<Mutex<SourceState>>,
    pending: Arc<Mutex<VecDeque<Song>>>,
}

impl MopidyBackend {
    pub fn new(client: MopidyClient, settings: MopidySettings) -> Self {
        Self {
            client: Arc::new(client),
            settings,
            state: Arc::new(Mutex::new(SourceState::default())),
            pending: Arc::new(Mutex::new(VecDeque::new())),
        }
    }
}

#[async_trait]
impl SourceBackend for MopidyBackend {
    type Session = MopidySession;

    async fn connect(&self) -> Result<MopidySession, SourceError> {
        // Reset mopidy into a blank state before the new master takes over.
        self.client.set_consume(true).await?;
        self.client.clear_tracklist().await?;
        self.client.stop().await?;

        let baseline = self.client.history().await?.len();

        self.pending.lock().expect("pending lock poisoned").clear();
        self.state.lock().expect("state lock poisoned").now_playing = None;

        let (finished_tx, finished_rx) = flume::bounded(2 * self.settings.max_queue_size);
        let cancel = CancellationToken::new();
        let monitor = Monitor {
            client: self.client.clone(),
            poll_interval: self.settings.poll_interval,
            pending: self.pending.clone(),
            state: self.state.clone(),
            finished_tx,
        };
        tokio::spawn(monitor.run(baseline, cancel.clone()));

        Ok(MopidySession {
            client: self.client.clone(),
            max_queue_size: self.settings.max_queue_size,
            pending: self.pending.clone(),
            state: self.state.clone(),
            finished_rx,
            cancel,
        })
    }

    async fn skip(&self) -> Result<(), SourceError> {
        self.client.next().await?;
        Ok(())
    }

    fn now_playing(&self) -> Option<Song> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .now_playing
            .clone()
    }

    fn play_history(&self) -> Vec<Song> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .history
            .clone()
    }
}

pub struct MopidySession {
    client: Arc<MopidyClient>,
    max_queue_size: usize,
    pending: Arc<Mutex<VecDeque<Song>>>,
    state: Arc<Mutex<SourceState>>,
    finished_rx: flume::Receiver<Song>,
    cancel: CancellationToken,
}

impl Drop for MopidySession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl SourceSession for MopidySession {
    async fn queue_song(&mut self, song: Song) -> Result<QueueOutcome, SourceError> {
        let query = SearchQuery {
            track_name: vec![song.name.clone()],
            artist: song.artists.clone(),
            genre: vec![],
        };
        let results = self.client.search(&query).await?;
        let mut tracks = results.into_iter().flat_map(|r| r.tracks);

        // Just take the first result
        let Some(track) = tracks.next() else {
            return Ok(QueueOutcome::NotFound);
        };

        let queued = self.pending.lock().expect("pending lock poisoned").len();
        if queued >= self.max_queue_size {
            warn!("Queue size limit reached: {queued}");
            return Ok(QueueOutcome::Rejected);
        }

        let added = self.client.add_tracks(std::slice::from_ref(&track)).await?;
        if added.is_empty() {
            return Ok(QueueOutcome::NotFound);
        }

        info!("Queueing {song}");
        {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            pending.push_back(song.clone());
            if pending.len() == 1 {
                self.state.lock().expect("state lock poisoned").now_playing = Some(song);
            }
        }

        // If we aren't playing (for whatever reason), make sure we play.
        match self.client.current_state().await? {
            PlaybackState::Stopped => self.client.play().await?,
            PlaybackState::Paused => self.client.resume().await?,
            _ => {}
        }

        Ok(QueueOutcome::Queued)
    }

    fn finished_songs(&self) -> flume::Receiver<Song> {
        self.finished_rx.clone()
    }
}

struct Monitor {
    client: Arc<MopidyClient>,
    poll_interval: Duration,
    pending: Arc<Mutex<VecDeque<Song>>>,
    state: Arc<Mutex<SourceState>>,
    finished_tx: flume::Sender<Song>,
}

impl Monitor {
    async fn run(self, baseline: usize, cancel: CancellationToken) {
        // A song enters history once it starts playing, so the expected
        // count starts one above the baseline.
        let mut current_size = baseline + 1;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Session monitor stopped");
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let history = match self.client.history().await {
                Ok(history) => history,
                Err(e) => {
                    warn!("Error retrieving history: {e}");
                    continue;
                }
            };

            let new_size = history.len();
            if new_size < current_size {
                continue;
            }

            if new_size == current_size {
                // History didn't grow; if playback stopped, the last queued
                // song ran out without a successor.
                match self.client.current_state().await {
                    Ok(PlaybackState::Stopped) => {
                        if self.finish_one().await {
                            current_size += 1;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Error getting playback state: {e}"),
                }
                continue;
            }

            for _ in current_size..new_size {
                self.finish_one().await;
            }
            current_size = new_size;
        }
    }

    /// Retires the oldest pending song, publishing it as finished. Returns
    /// false when nothing was pending.
    async fn finish_one(&self) -> bool {
        let song = {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            let Some(song) = pending.pop_front() else {
                return false;
            };
            let mut state = self.state.lock().expect("state lock poisoned");
            state.now_playing = pending.front().cloned();
            state.history.push(song.clone());
            song
        };

        info!("Finished {song}");
        if self.finished_tx.send_async(song).await.is_err() {
            warn!("Finished channel disconnected, dropping notification");
        }
        true
    }
}

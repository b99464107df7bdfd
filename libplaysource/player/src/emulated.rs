use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{error, info, warn};

use crate::backend::{QueueOutcome, SourceBackend, SourceSession};
use crate::dto::song::Song;
use crate::dto::source_error::SourceError;
use crate::dto::source_state::SourceState;
use crate::pacer::ThreadPacer;
use crate::play_source::{DEFAULT_TRACK_PAUSE, PlaySource};
use crate::provider::ChannelQueue;

#[derive(Clone, Debug)]
pub struct EmulatedSettings {
    pub max_queue_size: usize,
    /// Probability that a queued song is reported as found.
    pub found_probability: f64,
    pub track_length: Duration,
}

impl Default for EmulatedSettings {
    fn default() -> Self {
        Self {
            max_queue_size: 3,
            found_probability: 0.9,
            track_length: DEFAULT_TRACK_PAUSE,
        }
    }
}

/// Provides the semantics of an actual playsource without requiring one.
///
/// Queued songs are fed through a [`PlaySource`] running on a dedicated
/// thread; each one is "played" for the configured track length, then
/// acknowledged and reported finished.
pub struct EmulatedBackend {
    settings: EmulatedSettings,
    queue_tx: flume::Sender<Song>,
    finished_rx: flume::Receiver<Song>,
    state: Arc<Mutex<SourceState>>,
    in_flight: Arc<AtomicUsize>,
}

impl EmulatedBackend {
    pub fn new(settings: EmulatedSettings) -> Self {
        let capacity = settings.max_queue_size.max(1);
        let (queue_tx, queue_rx) = flume::bounded(capacity);
        let (finished_tx, finished_rx) = flume::bounded(capacity);
        let state = Arc::new(Mutex::new(SourceState::default()));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let provider = Arc::new(ChannelQueue::new(
            queue_rx,
            finished_tx,
            state.clone(),
            in_flight.clone(),
        ));
        let track_length = settings.track_length;
        thread::spawn(move || {
            let mut source = PlaySource::new(provider, ThreadPacer, io::stdout(), track_length);
            loop {
                if let Err(e) = source.run() {
                    match e {
                        SourceError::Disconnected => {
                            info!("Queue channel closed, emulated source terminating")
                        }
                        e => error!("Emulated source terminated: {e}"),
                    }
                    break;
                }
            }
        });

        Self {
            settings,
            queue_tx,
            finished_rx,
            state,
            in_flight,
        }
    }
}

#[async_trait]
impl SourceBackend for EmulatedBackend {
    type Session = EmulatedSession;

    async fn connect(&self) -> Result<EmulatedSession, SourceError> {
        Ok(EmulatedSession {
            settings: self.settings.clone(),
            queue_tx: self.queue_tx.clone(),
            finished_rx: self.finished_rx.clone(),
            in_flight: self.in_flight.clone(),
        })
    }

    async fn skip(&self) -> Result<(), SourceError> {
        // The driver has no cancellation hook mid-track.
        Err(SourceError::Unsupported("skip"))
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

pub struct EmulatedSession {
    settings: EmulatedSettings,
    queue_tx: flume::Sender<Song>,
    finished_rx: flume::Receiver<Song>,
    in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl SourceSession for EmulatedSession {
    async fn queue_song(&mut self, song: Song) -> Result<QueueOutcome, SourceError> {
        // Perform the lookup immediately
        if rand::rng().random::<f64>() >= self.settings.found_probability {
            return Ok(QueueOutcome::NotFound);
        }

        if self.in_flight.load(Ordering::SeqCst) >= self.settings.max_queue_size {
            warn!("Queue size limit reached");
            return Ok(QueueOutcome::Rejected);
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.queue_tx
            .send_async(song)
            .await
            .map_err(|_| SourceError::Disconnected)?;

        Ok(QueueOutcome::Queued)
    }

    fn finished_songs(&self) -> flume::Receiver<Song> {
        self.finished_rx.clone()
    }
}

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use futures::Future;
use libplaysource_player::playsource_player::{
    EmulatedBackend, EmulatedSettings, Pacer, PlaySource, QueueOutcome, QueueProvider, Song,
    SourceBackend, SourceError, SourceSession,
};
use pretty_assertions::assert_eq;
use rstest::*;
use tokio::time::error::Elapsed;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn timed_await<T>(future: T) -> Result<T::Output, Elapsed>
where
    T: Future,
{
    timeout(Duration::from_secs(10), future).await
}

fn song(id: i32, name: &str) -> Song {
    Song {
        id,
        name: name.to_owned(),
        artists: vec![format!("artist {id}")],
        genre: "Dubstep".to_owned(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Event {
    Emitted(String),
    Paced(Duration),
    Acknowledged,
}

type EventLog = Arc<Mutex<Vec<Event>>>;

struct StaticQueue {
    songs: Vec<Song>,
    fail: bool,
    log: EventLog,
}

impl QueueProvider for StaticQueue {
    fn queue(&self) -> Result<Vec<Song>, SourceError> {
        if self.fail {
            return Err(SourceError::Disconnected);
        }
        Ok(self.songs.clone())
    }

    fn song_finished(&self) {
        self.log
            .lock()
            .unwrap()
            .push(Event::Acknowledged);
    }
}

struct RecordingPacer {
    log: EventLog,
}

impl Pacer for RecordingPacer {
    fn pace(&self, interval: Duration) {
        self.log.lock().unwrap().push(Event::Paced(interval));
    }
}

// Collects whole diagnostic lines; a single emission may arrive as several
// write calls.
struct LineWriter {
    log: EventLog,
    buf: Vec<u8>,
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            self.log
                .lock()
                .unwrap()
                .push(Event::Emitted(String::from_utf8(line).unwrap()));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run_static_queue(songs: Vec<Song>) -> (Result<(), SourceError>, Vec<Event>) {
    let log = EventLog::default();
    let provider = Arc::new(StaticQueue {
        songs,
        fail: false,
        log: log.clone(),
    });
    let writer = LineWriter {
        log: log.clone(),
        buf: Vec::new(),
    };
    let mut source = PlaySource::new(
        provider,
        RecordingPacer { log: log.clone() },
        writer,
        Duration::from_secs(5),
    );

    let result = source.run();
    let events = log.lock().unwrap().clone();
    (result, events)
}

#[rstest(num_songs, case(1), case(2), case(3))]
fn test_processes_queue_in_order(num_songs: usize) {
    let songs: Vec<Song> = (0..num_songs as i32)
        .map(|i| song(i, &format!("song {i}")))
        .collect();
    let (result, events) = run_static_queue(songs.clone());
    assert!(result.is_ok());

    // Each entry is emitted, paced, then acknowledged before the next one
    // starts.
    assert_eq!(3 * num_songs, events.len());
    for (i, song) in songs.iter().enumerate() {
        assert_eq!(
            vec![
                Event::Emitted(format!("Playing: {song}\n")),
                Event::Paced(Duration::from_secs(5)),
                Event::Acknowledged,
            ],
            events[3 * i..3 * (i + 1)].to_vec()
        );
    }
}

#[rstest]
fn test_empty_queue_completes_immediately() {
    let (result, events) = run_static_queue(vec![]);
    assert!(result.is_ok());
    assert_eq!(Vec::<Event>::new(), events);
}

#[rstest]
fn test_emission_format() {
    let (result, events) = run_static_queue(vec![Song {
        id: 0,
        name: "Bangarang".to_owned(),
        artists: vec!["Skrillex".to_owned()],
        genre: "Dubstep".to_owned(),
    }]);
    assert!(result.is_ok());
    assert_eq!(
        Event::Emitted("Playing: Skrillex: Bangarang (Dubstep)\n".to_owned()),
        events[0]
    );
}

#[rstest]
fn test_provider_failure_processes_nothing() {
    let log = EventLog::default();
    let provider = Arc::new(StaticQueue {
        songs: vec![song(0, "never played")],
        fail: true,
        log: log.clone(),
    });
    let writer = LineWriter {
        log: log.clone(),
        buf: Vec::new(),
    };
    let mut source = PlaySource::new(
        provider,
        RecordingPacer { log: log.clone() },
        writer,
        Duration::from_secs(5),
    );

    assert_matches!(source.run(), Err(SourceError::Disconnected));
    assert_eq!(0, log.lock().unwrap().len());
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_emulated_finishes_songs_in_order() {
    let backend = EmulatedBackend::new(EmulatedSettings {
        max_queue_size: 3,
        found_probability: 1.0,
        track_length: Duration::ZERO,
    });
    let mut session = backend.connect().await.unwrap();
    let finished = session.finished_songs();

    for i in 0..3 {
        let outcome = session.queue_song(song(i, &format!("song {i}"))).await;
        assert_matches!(outcome, Ok(QueueOutcome::Queued));
    }

    for i in 0..3 {
        let done = timed_await(finished.recv_async()).await.unwrap().unwrap();
        assert_eq!(i, done.id);
    }

    assert_eq!(None, backend.now_playing());
    let history: Vec<i32> = backend.play_history().iter().map(|s| s.id).collect();
    assert_eq!(vec![0, 1, 2], history);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_emulated_reports_missing_songs() {
    let backend = EmulatedBackend::new(EmulatedSettings {
        max_queue_size: 3,
        found_probability: 0.0,
        track_length: Duration::ZERO,
    });
    let mut session = backend.connect().await.unwrap();

    let outcome = session.queue_song(song(0, "unfindable")).await;
    assert_matches!(outcome, Ok(QueueOutcome::NotFound));
    assert_eq!(0, backend.play_history().len());
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_emulated_rejects_when_full() {
    let backend = EmulatedBackend::new(EmulatedSettings {
        max_queue_size: 1,
        found_probability: 1.0,
        track_length: Duration::from_secs(60),
    });
    let mut session = backend.connect().await.unwrap();

    assert_matches!(
        session.queue_song(song(0, "first")).await,
        Ok(QueueOutcome::Queued)
    );
    assert_matches!(
        session.queue_song(song(1, "second")).await,
        Ok(QueueOutcome::Rejected)
    );
}

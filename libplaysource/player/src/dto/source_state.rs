use super::song::Song;

/// Playback state shared between a backend and its active session. The
/// monitor side writes it as songs start and finish; query RPCs read it.
#[derive(Debug, Default)]
pub(crate) struct SourceState {
    pub(crate) now_playing: Option<Song>,
    pub(crate) history: Vec<Song>,
}

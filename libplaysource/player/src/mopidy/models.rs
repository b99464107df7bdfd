use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Track {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Artist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

/// Mopidy's `core.playback.get_state` values.
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
    Unknown,
}

/// Arguments for `core.library.search`. Empty fields are omitted from the
/// request body.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub track_name: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artist: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub genre: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::MopidyError;
use super::models::{PlaybackState, SearchQuery, SearchResult, Track};

const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 client for a Mopidy server's HTTP endpoint.
pub struct MopidyClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

// History entries come back as [timestamp, ref] pairs
#[derive(Debug, Deserialize)]
struct HistoryRef {
    #[serde(default)]
    uri: String,
}

#[derive(Debug, Deserialize)]
struct TlTrack {
    #[serde(default)]
    track: Option<Track>,
}

impl MopidyClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one request and returns its `result`, `None` when the result
    /// was JSON null.
    async fn request<P, T>(&self, method: &str, params: P) -> Result<Option<T>, MopidyError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = self
            .http
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: JSONRPC_VERSION,
                id,
                method,
                params,
            })
            .send()
            .await?
            .bytes()
            .await?;

        parse_response(&body)
    }

    /// Sends one request, discarding the result.
    async fn notify<P: Serialize>(&self, method: &str, params: P) -> Result<(), MopidyError> {
        self.request::<_, serde_json::Value>(method, params)
            .await
            .map(|_| ())
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, MopidyError> {
        Ok(self
            .request("core.library.search", query)
            .await?
            .unwrap_or_default())
    }

    pub async fn play(&self) -> Result<(), MopidyError> {
        self.notify("core.playback.play", json!({})).await
    }

    pub async fn resume(&self) -> Result<(), MopidyError> {
        self.notify("core.playback.resume", json!({})).await
    }

    pub async fn pause(&self) -> Result<(), MopidyError> {
        self.notify("core.playback.pause", json!({})).await
    }

    pub async fn stop(&self) -> Result<(), MopidyError> {
        self.notify("core.playback.stop", json!({})).await
    }

    pub async fn next(&self) -> Result<(), MopidyError> {
        self.notify("core.playback.next", json!({})).await
    }

    pub async fn current_state(&self) -> Result<PlaybackState, MopidyError> {
        let state: Option<String> = self
            .request("core.playback.get_state", json!({}))
            .await?;
        Ok(state
            .and_then(|s| s.parse().ok())
            .unwrap_or(PlaybackState::Unknown))
    }

    pub async fn currently_playing(&self) -> Result<Option<Track>, MopidyError> {
        self.request("core.playback.get_current_track", json!({}))
            .await
    }

    /// URIs of every track that entered playback, most recent first.
    pub async fn history(&self) -> Result<Vec<String>, MopidyError> {
        let entries: Option<Vec<(i64, HistoryRef)>> = self
            .request("core.history.get_history", json!({}))
            .await?;
        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .map(|(_, entry)| entry.uri)
            .collect())
    }

    pub async fn set_consume(&self, consume: bool) -> Result<(), MopidyError> {
        self.notify("core.tracklist.set_consume", json!({ "value": consume }))
            .await
    }

    pub async fn add_tracks(&self, tracks: &[Track]) -> Result<Vec<Track>, MopidyError> {
        let uris: Vec<&str> = tracks.iter().map(|t| t.uri.as_str()).collect();
        let added: Option<Vec<TlTrack>> = self
            .request("core.tracklist.add", json!({ "uris": uris }))
            .await?;
        Ok(added
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| t.track)
            .collect())
    }

    pub async fn clear_tracklist(&self) -> Result<(), MopidyError> {
        self.notify("core.tracklist.clear", json!({})).await
    }
}

fn parse_response<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, MopidyError> {
    let response: RpcResponse<T> = serde_json::from_slice(body)?;
    if let Some(error) = response.error {
        return Err(MopidyError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    Ok(response.result)
}

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use libplaysource_player::playsource_player::{
    QueueOutcome, Song, SourceBackend, SourceError, SourceSession,
};
use tokio::sync::{Semaphore, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{error, info, warn};

use crate::rpc::v1 as pb;
use crate::rpc::v1::play_source_server::PlaySource;

pub struct PlaySourceImpl<B: SourceBackend> {
    backend: Arc<B>,
    // One permit; whoever holds it is the master and controls the queue.
    master: Arc<Semaphore>,
}

impl<B: SourceBackend> PlaySourceImpl<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            master: Arc::new(Semaphore::new(1)),
        }
    }
}

fn format_error(msg: String) -> Status {
    error!("{:?}", msg);
    Status::internal(msg)
}

fn to_song(song: pb::Song) -> Song {
    Song {
        id: song.song_id,
        name: song.name,
        artists: song.artists,
        genre: song.genre,
    }
}

fn from_song(song: Song) -> pb::Song {
    pb::Song {
        song_id: song.id,
        name: song.name,
        artists: song.artists,
        genre: song.genre,
    }
}

#[tonic::async_trait]
impl<B: SourceBackend> PlaySource for PlaySourceImpl<B> {
    type QueueSongStream =
        Pin<Box<dyn Stream<Item = Result<pb::QueueSongResponse, Status>> + Send + 'static>>;

    async fn queue_song(
        &self,
        request: Request<Streaming<pb::QueueSongRequest>>,
    ) -> Result<Response<Self::QueueSongStream>, Status> {
        info!("Client connected");

        let permit = match self.master.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => return Err(Status::unavailable("a master already exists")),
        };

        let mut session = self
            .backend
            .connect()
            .await
            .map_err(|e| format_error(format!("Error connecting to source: {e:?}")))?;
        let finished = session.finished_songs();
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            // Dropping the permit when this task ends lets the next client in.
            let _permit = permit;
            loop {
                tokio::select! {
                    request = inbound.message() => match request {
                        Ok(Some(request)) => {
                            let Some(song) = request.song else {
                                warn!("Received queue request without a song");
                                continue;
                            };
                            info!("Received queue song request: {}", song.name);

                            let song_id = song.song_id;
                            match session.queue_song(to_song(song)).await {
                                // Queued songs are answered when they finish.
                                Ok(QueueOutcome::Queued) => {}
                                Ok(QueueOutcome::NotFound) => {
                                    let response = pb::QueueSongResponse {
                                        song_id,
                                        queued: false,
                                        found: false,
                                        finished: false,
                                    };
                                    if tx.send(Ok(response)).await.is_err() {
                                        break;
                                    }
                                }
                                Ok(QueueOutcome::Rejected) => {
                                    let response = pb::QueueSongResponse {
                                        song_id,
                                        queued: false,
                                        found: true,
                                        finished: false,
                                    };
                                    if tx.send(Ok(response)).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    let status =
                                        format_error(format!("Error queueing song: {e:?}"));
                                    tx.send(Err(status)).await.unwrap_or_default();
                                    break;
                                }
                            }
                        }
                        Ok(None) => {
                            info!("Queue stream closed");
                            break;
                        }
                        Err(status) => {
                            warn!("Error reading queue stream: {status:?}");
                            break;
                        }
                    },
                    song = finished.recv_async() => match song {
                        Ok(song) => {
                            info!("Finished: {song}");
                            let response = pb::QueueSongResponse {
                                song_id: song.id,
                                queued: false,
                                found: true,
                                finished: true,
                            };
                            if tx.send(Ok(response)).await.is_err() {
                                break;
                            }
                        }
                        Err(_) => {
                            warn!("Finished channel closed");
                            break;
                        }
                    },
                }
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn skip_song(
        &self,
        _: Request<pb::SkipSongRequest>,
    ) -> Result<Response<pb::SkipSongResponse>, Status> {
        match self.backend.skip().await {
            Ok(()) => Ok(Response::new(pb::SkipSongResponse {})),
            Err(SourceError::Unsupported(op)) => Err(Status::unimplemented(op)),
            Err(e) => Err(format_error(format!("Error skipping song: {e:?}"))),
        }
    }

    async fn get_playing(
        &self,
        _: Request<pb::GetPlayingRequest>,
    ) -> Result<Response<pb::GetPlayingResponse>, Status> {
        Ok(Response::new(pb::GetPlayingResponse {
            song: self.backend.now_playing().map(from_song),
        }))
    }

    type GetPlayHistoryStream =
        Pin<Box<dyn Stream<Item = Result<pb::GetPlayHistoryResponse, Status>> + Send + 'static>>;

    async fn get_play_history(
        &self,
        _: Request<pb::GetPlayHistoryRequest>,
    ) -> Result<Response<Self::GetPlayHistoryStream>, Status> {
        let history = self.backend.play_history();
        Ok(Response::new(Box::pin(tokio_stream::iter(
            history.into_iter().map(|song| {
                Ok(pb::GetPlayHistoryResponse {
                    song: Some(from_song(song)),
                })
            }),
        ))))
    }
}

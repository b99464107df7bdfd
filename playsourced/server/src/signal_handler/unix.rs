use eyre::Result;
use futures::stream::StreamExt;
use signal_hook::consts::signal::*;
use signal_hook_tokio::{Handle, Signals};
use tokio::sync::broadcast::Sender;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct SignalHandler {
    handle: Handle,
    task: JoinHandle<()>,
}

impl SignalHandler {
    pub fn start(shutdown_tx: Sender<()>) -> Result<Self> {
        let signals = Signals::new([SIGHUP, SIGTERM, SIGINT, SIGQUIT])?;
        let handle = signals.handle();

        let task = tokio::spawn(async move {
            let mut signals = signals.fuse();
            while let Some(signal) = signals.next().await {
                info!("Received signal {signal}, shutting down");
                if let Err(e) = shutdown_tx.send(()) {
                    error!("Error broadcasting shutdown: {e:?}");
                }
            }
        });

        Ok(Self { handle, task })
    }

    pub async fn close(self) -> Result<()> {
        self.handle.close();
        Ok(self.task.await?)
    }
}

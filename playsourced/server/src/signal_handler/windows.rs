use eyre::Result;
use tokio::sync::broadcast::Sender;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub struct SignalHandler {
    task: JoinHandle<()>,
}

impl SignalHandler {
    pub fn start(shutdown_tx: Sender<()>) -> Result<Self> {
        let task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received ctrl-c, shutting down");
                if let Err(e) = shutdown_tx.send(()) {
                    error!("Error broadcasting shutdown: {e:?}");
                }
            }
        });

        Ok(Self { task })
    }

    pub async fn close(self) -> Result<()> {
        self.task.abort();
        let _ = self.task.await;
        Ok(())
    }
}

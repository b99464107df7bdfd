use std::thread;
use std::time::Duration;

/// Time source for playback pacing. Injected so tests can run a queue
/// through the driver without real delay.
pub trait Pacer {
    fn pace(&self, interval: Duration);
}

/// Blocks the calling thread for the full interval. The driver runs on a
/// dedicated thread, so this never stalls the async runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pace(&self, interval: Duration) {
        thread::sleep(interval);
    }
}

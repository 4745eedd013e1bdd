//! Periodic heartbeat ticking for a ring's membership sweep.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Drives a repeating tick at `interval`, invoking `on_tick` each time,
/// until cancelled. Used to run [`crate::FirstRing::sweep_heartbeats`]
/// on a schedule without coupling the ring's own logic to tokio.
pub struct HeartbeatMonitor {
    cancel: CancellationToken,
}

impl HeartbeatMonitor {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
        }
    }

    pub fn spawn<F>(&self, interval: Duration, mut on_tick: F) -> tokio::task::JoinHandle<()>
    where
        F: FnMut() + Send + 'static,
    {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                on_tick();
            }
        })
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Default for HeartbeatMonitor {
    fn default() -> Self {
        Self::new()
    }
}

//! Stop signal and open-connection count for the dev server.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

/// Shared between the accept loop, every connection guard and any
/// [`ServerHandle`](super::ServerHandle).
#[derive(Debug, Default)]
pub struct ShutdownManager {
    requested: AtomicBool,
    stop: Notify,
    connections: AtomicUsize,
    idle: Notify,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal_shutdown(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.stop.notify_waiters();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves on Ctrl-C, SIGTERM or [`signal_shutdown`](Self::signal_shutdown).
    pub async fn wait_for_shutdown(&self) -> std::io::Result<()> {
        let stop = self.stop.notified();
        if self.is_shutting_down() {
            return Ok(());
        }

        tokio::select! {
            result = os_signal() => result?,
            _ = stop => {}
        }

        self.requested.store(true, Ordering::SeqCst);
        tracing::info!("Stop requested");
        Ok(())
    }

    pub fn active_connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn connection_opened(&self) {
        self.connections.fetch_add(1, Ordering::SeqCst);
    }

    pub fn connection_closed(&self) {
        if self.connections.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    /// Wait until no connection is open. Returns false if `timeout` ran out first.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let idle = self.idle.notified();
            if self.active_connections() == 0 {
                return true;
            }
            if tokio::time::timeout_at(deadline, idle).await.is_err() {
                tracing::warn!(
                    remaining = self.active_connections(),
                    "Connections still open after {:?}",
                    timeout
                );
                return false;
            }
        }
    }
}

#[cfg(unix)]
async fn os_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn os_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

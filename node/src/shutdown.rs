//! Graceful shutdown controller.
//!
//! Listens for SIGINT/SIGTERM and flips a `tokio::sync::watch` flag that the
//! HTTP server awaits. Subscribers created after the flip still see it.

use std::future::Future;

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// Coordinates graceful shutdown across the node's tasks.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.tx.borrow()
    }

    /// A future that completes once shutdown has been triggered.
    pub fn notified(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            // An error means the controller is gone, which is shutdown too.
            let _ = rx.wait_for(|stopping| *stopping).await;
        }
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("received SIGINT, shutting down"),
                Err(e) => warn!(error = %e, "SIGINT handler failed, shutting down"),
            },
            _ = terminate => info!("received SIGTERM, shutting down"),
            _ = self.notified() => return,
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

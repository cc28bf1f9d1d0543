//! Background polling for the backend's sync status.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::client::CoachBackend;
use crate::types::SyncStatus;

/// Polls `sync_status` on a fixed interval and publishes the latest value.
/// A failed poll keeps the previous value. Dropping the poller stops the
/// task; it never outlives its owner.
pub struct SyncPoller {
    rx: watch::Receiver<Option<SyncStatus>>,
    handle: JoinHandle<()>,
}

impl SyncPoller {
    pub fn spawn(backend: Arc<dyn CoachBackend>, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match backend.sync_status().await {
                    Ok(status) => {
                        tx.send_replace(Some(status));
                    }
                    Err(err) => {
                        warn!(error = %err, "sync status poll failed, keeping last value");
                    }
                }
            }
        });
        info!(interval_secs = interval.as_secs(), "sync status poller started");
        Self { rx, handle }
    }

    /// Latest status, if any poll has succeeded yet.
    pub fn latest(&self) -> Option<SyncStatus> {
        self.rx.borrow().clone()
    }

    /// Receiver for callers that want change notifications.
    pub fn subscribe(&self) -> watch::Receiver<Option<SyncStatus>> {
        self.rx.clone()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for SyncPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

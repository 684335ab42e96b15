//! Status indicator
//!
//! Publishes the coarse status a tray icon would show. The only state kept
//! here is when the last batch started and when its settle window ends;
//! everything else is derived from the configuration on demand.

use hddping_core::{Configuration, Status, MAX_SETTLE_WINDOW};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::info;

pub(crate) struct StatusIndicator {
    settle_window: Duration,
    last_batch_start: Option<Instant>,
    /// Pending "working → settled" transition. A newer batch replaces it.
    settle_deadline: Option<Instant>,
    tx: watch::Sender<Status>,
}

impl StatusIndicator {
    /// Windows longer than [`MAX_SETTLE_WINDOW`] are capped.
    pub fn new(settle_window: Duration, config: &Configuration) -> Self {
        let settle_window = settle_window.min(MAX_SETTLE_WINDOW);
        let initial = Status::derive(config.any_enabled(), None, settle_window);
        let (tx, _rx) = watch::channel(initial);
        Self {
            settle_window,
            last_batch_start: None,
            settle_deadline: None,
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Status {
        *self.tx.borrow()
    }

    /// Re-derive the status after the configuration changed.
    pub fn recompute(&mut self, config: &Configuration) {
        let since = self.last_batch_start.map(|start| start.elapsed());
        let status = Status::derive(config.any_enabled(), since, self.settle_window);
        self.tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }

    /// Record a batch start and (re)arm the settle deadline.
    pub fn batch_started(&mut self, config: &Configuration) {
        let now = Instant::now();
        self.last_batch_start = Some(now);
        self.settle_deadline = now.checked_add(self.settle_window);
        self.recompute(config);
    }

    /// Resolves when the current settle window ends; never if none is pending.
    pub async fn settled(&self) {
        match self.settle_deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Settle window elapsed: fall back to enabled/disabled.
    pub fn settle(&mut self, config: &Configuration) {
        self.settle_deadline = None;
        self.recompute(config);
    }
}

/// Log every status change, the way a tray would swap its icon.
pub(crate) fn spawn_status_log(mut rx: watch::Receiver<Status>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Status: {}", rx.borrow_and_update().as_str());
        while rx.changed().await.is_ok() {
            let status = *rx.borrow_and_update();
            info!("Status: {}", status.as_str());
        }
    })
}

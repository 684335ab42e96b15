//! Keep-alive pings
//!
//! A ping writes a small, uniquely named file into the drive root and
//! deletes it again. The only point is to make the drive do physical I/O;
//! nothing is meant to survive, and no failure is reported upward as an
//! error.
//!
//! If the delete fails the file is left behind. That is one stray file per
//! failed attempt, and nothing here goes looking for them later.

use async_trait::async_trait;
use hddping_core::DriveId;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// Result of pinging a single drive
///
/// Every variant is a normal return: failures are recorded, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    /// File written and removed
    Completed,
    /// Could not create or write the file (drive offline, full, read-only)
    WriteFailed(io::ErrorKind),
    /// File written but not removed; it stays on the drive
    DeleteFailed(io::ErrorKind),
}

impl PingOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PingOutcome::Completed)
    }
}

/// Something that can ping a drive
///
/// Allows the scheduler to be tested without touching real volumes.
#[async_trait]
pub trait DrivePinger: Send + Sync {
    /// Ping `drive`. Never fails; the outcome is informational.
    async fn ping(&self, drive: &DriveId) -> PingOutcome;
}

/// Pings drives through the file system
#[derive(Debug, Default, Clone, Copy)]
pub struct FsPinger;

#[async_trait]
impl DrivePinger for FsPinger {
    async fn ping(&self, drive: &DriveId) -> PingOutcome {
        touch(drive.root()).await
    }
}

/// Write a file named by a fresh random token into `root`, then delete it.
pub async fn touch(root: &Path) -> PingOutcome {
    let token = Uuid::new_v4().to_string();
    let path = root.join(&token);

    if let Err(e) = fs::write(&path, token.as_bytes()).await {
        return PingOutcome::WriteFailed(e.kind());
    }

    match fs::remove_file(&path).await {
        Ok(()) => PingOutcome::Completed,
        Err(e) => PingOutcome::DeleteFailed(e.kind()),
    }
}

/// Summary of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Drives that were written and cleaned up
    pub completed: Vec<DriveId>,
    /// Drives whose ping failed, with the step that failed
    pub failed: Vec<(DriveId, PingOutcome)>,
    /// Ping tasks that panicked or were cancelled
    pub aborted: usize,
}

impl BatchReport {
    /// Number of drives the batch attempted
    pub fn attempted(&self) -> usize {
        self.completed.len() + self.failed.len() + self.aborted
    }
}

/// Ping every drive in `drives` concurrently.
///
/// Each drive runs in its own task, so a slow or failing drive neither
/// blocks nor skips the others. Returns once every ping has finished.
pub async fn ping_batch(pinger: Arc<dyn DrivePinger>, drives: Vec<DriveId>) -> BatchReport {
    let mut tasks = JoinSet::new();
    for drive in drives {
        let pinger = Arc::clone(&pinger);
        tasks.spawn(async move {
            let outcome = pinger.ping(&drive).await;
            (drive, outcome)
        });
    }

    let mut report = BatchReport::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((drive, PingOutcome::Completed)) => {
                debug!("Pinged {}", drive);
                report.completed.push(drive);
            }
            Ok((drive, outcome @ PingOutcome::WriteFailed(kind))) => {
                debug!("Ping write failed on {}: {:?}", drive, kind);
                report.failed.push((drive, outcome));
            }
            Ok((drive, outcome @ PingOutcome::DeleteFailed(kind))) => {
                warn!("Ping file left behind on {}: {:?}", drive, kind);
                report.failed.push((drive, outcome));
            }
            Err(e) => {
                warn!("Ping task aborted: {}", e);
                report.aborted += 1;
            }
        }
    }

    report
}

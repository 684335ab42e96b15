//! Control loop and control surface
//!
//! [`Controller`] is the single owner of the in-memory [`Configuration`].
//! Drive toggles, interval changes, manual pings, timer ticks and the
//! settle timer are all handled one at a time inside [`Controller::run`], so
//! the configuration needs no locking. Everything outside talks to it
//! through a cloneable [`ControlHandle`].

mod commands;
mod stdin;

pub(crate) use stdin::spawn_stdin_control;

use hddping_core::{Configuration, DriveId, DriveKind, HddPingError, Result, Status};
use hddping_volumes::{DrivePinger, DriveRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::config::SettingsStore;
use crate::scheduler::{PingScheduler, SchedulerEvent};
use crate::status::StatusIndicator;

/// Queue depth for pending control commands
const COMMAND_QUEUE: usize = 32;

/// Messages accepted by the control loop
#[derive(Debug)]
pub(crate) enum ControlCommand {
    ToggleDrive {
        drive: DriveId,
        reply: oneshot::Sender<Result<bool>>,
    },
    SetDrive {
        drive: DriveId,
        enabled: bool,
        reply: oneshot::Sender<Result<()>>,
    },
    SetInterval {
        interval: Duration,
        reply: oneshot::Sender<Result<()>>,
    },
    PingNow {
        reply: oneshot::Sender<bool>,
    },
    Save {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    Exit,
}

/// One attached drive as offered for toggling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DriveEntry {
    pub drive: DriveId,
    pub kind: DriveKind,
    pub enabled: bool,
}

/// Point-in-time view of the daemon for a control surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Snapshot {
    pub status: Status,
    pub interval_secs: u64,
    pub scheduler: &'static str,
    pub drives: Vec<DriveEntry>,
}

/// Cloneable entry point into the control loop
#[derive(Debug, Clone)]
pub(crate) struct ControlHandle {
    tx: mpsc::Sender<ControlCommand>,
    status: watch::Receiver<Status>,
}

impl ControlHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ControlCommand,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| HddPingError::ControlClosed)?;
        rx.await.map_err(|_| HddPingError::ControlClosed)
    }

    /// Flip whether `drive` is pinged. Returns the new state.
    pub async fn toggle_drive(&self, drive: DriveId) -> Result<bool> {
        self.request(|reply| ControlCommand::ToggleDrive { drive, reply })
            .await?
    }

    pub async fn set_drive(&self, drive: DriveId, enabled: bool) -> Result<()> {
        self.request(|reply| ControlCommand::SetDrive {
            drive,
            enabled,
            reply,
        })
        .await?
    }

    /// Change the ping interval; the next tick is one interval from now.
    pub async fn set_interval(&self, interval: Duration) -> Result<()> {
        self.request(|reply| ControlCommand::SetInterval { interval, reply })
            .await?
    }

    /// Ping all enabled drives now. Returns whether a batch was started.
    pub async fn ping_now(&self) -> Result<bool> {
        self.request(|reply| ControlCommand::PingNow { reply }).await
    }

    /// Write the settings file now. Returns whether the write succeeded.
    pub async fn save(&self) -> Result<bool> {
        self.request(|reply| ControlCommand::Save { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(|reply| ControlCommand::Snapshot { reply })
            .await
    }

    /// Ask the control loop to stop. Saving is left to the caller of `run`.
    pub async fn exit(&self) -> Result<()> {
        self.tx
            .send(ControlCommand::Exit)
            .await
            .map_err(|_| HddPingError::ControlClosed)
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.status.clone()
    }
}

/// Owner of configuration, scheduler and status
pub(crate) struct Controller {
    config: Configuration,
    registry: DriveRegistry,
    store: SettingsStore,
    pinger: Arc<dyn DrivePinger>,
    scheduler: PingScheduler,
    status: StatusIndicator,
    commands: mpsc::Receiver<ControlCommand>,
}

impl Controller {
    /// Build the controller and arm the ping timer.
    pub fn new(
        config: Configuration,
        registry: DriveRegistry,
        store: SettingsStore,
        pinger: Arc<dyn DrivePinger>,
        settle_window: Duration,
    ) -> (Self, ControlHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let scheduler = PingScheduler::new(config.interval());
        let status = StatusIndicator::new(settle_window, &config);
        let handle = ControlHandle {
            tx,
            status: status.subscribe(),
        };

        let controller = Self {
            config,
            registry,
            store,
            pinger,
            scheduler,
            status,
            commands,
        };
        (controller, handle)
    }

    /// Run until an exit request or until every handle is dropped.
    ///
    /// Returns the final configuration so the caller can persist it. An
    /// in-flight batch is not waited for.
    pub async fn run(mut self) -> Configuration {
        info!(
            "Pinging every {}s, {} of {} drive(s) enabled",
            self.scheduler.period().as_secs(),
            self.config.enabled_drives().len(),
            self.registry.len()
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(ControlCommand::Exit) => {
                        info!("Exit requested");
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("All control handles dropped");
                        break;
                    }
                },
                event = self.scheduler.next_event() => self.handle_scheduler_event(event),
                _ = self.status.settled() => self.status.settle(&self.config),
            }
        }

        self.config
    }

    async fn handle_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::ToggleDrive { drive, reply } => {
                let _ = reply.send(self.toggle_drive(&drive));
            }
            ControlCommand::SetDrive {
                drive,
                enabled,
                reply,
            } => {
                let _ = reply.send(self.set_drive(drive, enabled));
            }
            ControlCommand::SetInterval { interval, reply } => {
                let _ = reply.send(self.set_interval(interval));
            }
            ControlCommand::PingNow { reply } => {
                let _ = reply.send(self.start_batch("manual"));
            }
            ControlCommand::Save { reply } => {
                let _ = reply.send(self.store.save(&self.config).await);
            }
            ControlCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            ControlCommand::Exit => {}
        }
    }

    fn handle_scheduler_event(&mut self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Tick => {
                self.start_batch("timer");
            }
            SchedulerEvent::BatchFinished(report) => {
                if report.failed.is_empty() && report.aborted == 0 {
                    info!("Ping batch finished: {} drive(s)", report.completed.len());
                } else {
                    warn!(
                        "Ping batch finished: {} ok, {} failed, {} aborted",
                        report.completed.len(),
                        report.failed.len(),
                        report.aborted
                    );
                }
                self.status.recompute(&self.config);
            }
        }
    }

    fn toggle_drive(&mut self, drive: &DriveId) -> Result<bool> {
        self.ensure_attached(drive)?;
        let enabled = self.config.toggle(drive);
        info!(
            "Drive {} {}",
            drive,
            if enabled { "enabled" } else { "disabled" }
        );
        self.status.recompute(&self.config);
        Ok(enabled)
    }

    fn set_drive(&mut self, drive: DriveId, enabled: bool) -> Result<()> {
        self.ensure_attached(&drive)?;
        info!(
            "Drive {} {}",
            drive,
            if enabled { "enabled" } else { "disabled" }
        );
        self.config.add_or_update(drive, enabled);
        self.status.recompute(&self.config);
        Ok(())
    }

    fn ensure_attached(&self, drive: &DriveId) -> Result<()> {
        if self.registry.contains(drive) {
            Ok(())
        } else {
            Err(HddPingError::DriveNotFound(drive.to_string()))
        }
    }

    /// Update the configuration and re-arm the timer in one step.
    fn set_interval(&mut self, interval: Duration) -> Result<()> {
        self.config.set_interval(interval)?;
        self.scheduler.reconfigure(interval);
        info!("Ping interval set to {}s", interval.as_secs());
        Ok(())
    }

    /// Start a batch over the enabled drives, unless one is already running.
    fn start_batch(&mut self, trigger: &str) -> bool {
        let drives = self.config.enabled_drives();
        if drives.is_empty() {
            debug!("No drives enabled, skipping {} ping", trigger);
            return false;
        }

        let count = drives.len();
        if !self.scheduler.start_batch(Arc::clone(&self.pinger), drives) {
            info!("Previous batch still running, skipping {} ping", trigger);
            return false;
        }

        debug!("Started {} ping of {} drive(s)", trigger, count);
        self.status.batch_started(&self.config);
        true
    }

    fn snapshot(&self) -> Snapshot {
        let drives = self
            .registry
            .drives()
            .iter()
            .map(|d| DriveEntry {
                drive: d.id.clone(),
                kind: d.kind,
                enabled: self.config.is_enabled(&d.id),
            })
            .collect();

        Snapshot {
            status: self.status.current(),
            interval_secs: self.config.interval().as_secs(),
            scheduler: self.scheduler.state().as_str(),
            drives,
        }
    }
}

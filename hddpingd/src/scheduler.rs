//! Ping scheduler
//!
//! Owns the recurring timer and the batch currently in flight. Two states
//! are visible from outside: `Idle` (timer armed, nothing running) and
//! `Running` (a batch is pinging drives).
//!
//! When a tick arrives while a batch is still running, the tick is skipped
//! rather than starting a second batch. The timer keeps arming ticks in the
//! meantime, so a drive that hangs delays nothing but its own batch.

use hddping_core::{DriveId, MAX_INTERVAL};
use hddping_volumes::{ping_batch, BatchReport, DrivePinger};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Scheduler state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchedulerState {
    /// Timer armed, waiting for the next tick
    Idle,
    /// A ping batch is executing
    Running,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
        }
    }
}

/// Something the control loop has to react to
#[derive(Debug)]
pub(crate) enum SchedulerEvent {
    /// The interval elapsed
    Tick,
    /// The running batch completed; the scheduler is idle again
    BatchFinished(BatchReport),
}

pub(crate) struct PingScheduler {
    period: Duration,
    ticker: Interval,
    batch: Option<JoinHandle<BatchReport>>,
}

impl PingScheduler {
    /// Arm a timer whose first tick is one `period` from now.
    ///
    /// Periods above [`MAX_INTERVAL`] are capped.
    pub fn new(period: Duration) -> Self {
        let period = period.min(MAX_INTERVAL);
        Self {
            period,
            ticker: Self::arm(period),
            batch: None,
        }
    }

    fn arm(period: Duration) -> Interval {
        let now = Instant::now();
        let start = now.checked_add(period).unwrap_or(now);
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> SchedulerState {
        if self.batch.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Replace the timer with one ticking every `period`, starting now.
    ///
    /// The old timer is dropped by the assignment and nothing else holds
    /// it, so only one timer ever drives ticks. A running batch is left alone.
    pub fn reconfigure(&mut self, period: Duration) {
        let period = period.min(MAX_INTERVAL);
        self.ticker = Self::arm(period);
        debug!(
            "Ping interval changed from {}s to {}s",
            self.period.as_secs(),
            period.as_secs()
        );
        self.period = period;
    }

    /// Start pinging `drives` in the background.
    ///
    /// Returns `false` and does nothing if a batch is already running.
    pub fn start_batch(&mut self, pinger: Arc<dyn DrivePinger>, drives: Vec<DriveId>) -> bool {
        if self.batch.is_some() {
            return false;
        }
        self.batch = Some(tokio::spawn(ping_batch(pinger, drives)));
        true
    }

    /// Wait for the next tick or for the running batch to finish.
    ///
    /// Cancel safe: dropping the future loses neither a tick nor a batch.
    pub async fn next_event(&mut self) -> SchedulerEvent {
        let Some(batch) = self.batch.as_mut() else {
            self.ticker.tick().await;
            return SchedulerEvent::Tick;
        };

        let joined = tokio::select! {
            biased;
            joined = batch => joined,
            _ = self.ticker.tick() => return SchedulerEvent::Tick,
        };
        self.batch = None;

        let report = joined.unwrap_or_else(|e| {
            warn!("Ping batch task failed: {}", e);
            BatchReport::default()
        });
        SchedulerEvent::BatchFinished(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hddping_volumes::PingOutcome;
    use std::sync::Mutex;
    use tokio::time::sleep;

    /// Pinger that takes `delay` per drive and records when it was called
    struct SlowPinger {
        delay: Duration,
        calls: Mutex<Vec<Instant>>,
    }

    impl SlowPinger {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DrivePinger for SlowPinger {
        async fn ping(&self, _drive: &DriveId) -> PingOutcome {
            self.calls.lock().unwrap().push(Instant::now());
            sleep(self.delay).await;
            PingOutcome::Completed
        }
    }

    fn drives(n: usize) -> Vec<DriveId> {
        (0..n).map(|i| DriveId::new(format!("/mnt/d{}", i))).collect()
    }

    #[test]
    fn test_scheduler_state_as_str() {
        assert_eq!(SchedulerState::Idle.as_str(), "idle");
        assert_eq!(SchedulerState::Running.as_str(), "running");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let start = Instant::now();
        let mut scheduler = PingScheduler::new(Duration::from_secs(60));

        assert!(matches!(scheduler.next_event().await, SchedulerEvent::Tick));
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_transitions_running_to_idle() {
        let pinger = SlowPinger::new(Duration::from_secs(2));
        let mut scheduler = PingScheduler::new(Duration::from_secs(300));

        assert!(scheduler.start_batch(pinger.clone(), drives(3)));
        assert_eq!(scheduler.state(), SchedulerState::Running);

        match scheduler.next_event().await {
            SchedulerEvent::BatchFinished(report) => assert_eq!(report.completed.len(), 3),
            other => panic!("Expected BatchFinished, got {:?}", other),
        }
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(pinger.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_batch_skipped_while_running() {
        let pinger = SlowPinger::new(Duration::from_secs(10));
        let mut scheduler = PingScheduler::new(Duration::from_secs(300));

        assert!(scheduler.start_batch(pinger.clone(), drives(1)));
        assert!(!scheduler.start_batch(pinger.clone(), drives(1)));

        scheduler.next_event().await;
        assert!(scheduler.start_batch(pinger.clone(), drives(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_keep_coming_during_long_batch() {
        let pinger = SlowPinger::new(Duration::from_secs(150));
        let mut scheduler = PingScheduler::new(Duration::from_secs(60));
        let start = Instant::now();

        scheduler.start_batch(pinger, drives(1));

        assert!(matches!(scheduler.next_event().await, SchedulerEvent::Tick));
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert!(matches!(scheduler.next_event().await, SchedulerEvent::Tick));
        assert_eq!(start.elapsed(), Duration::from_secs(120));
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert!(matches!(
            scheduler.next_event().await,
            SchedulerEvent::BatchFinished(_)
        ));
        assert_eq!(start.elapsed(), Duration::from_secs(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_restarts_period_from_now() {
        let mut scheduler = PingScheduler::new(Duration::from_secs(300));
        let start = Instant::now();

        sleep(Duration::from_secs(100)).await;
        scheduler.reconfigure(Duration::from_secs(60));
        assert_eq!(scheduler.period(), Duration::from_secs(60));

        assert!(matches!(scheduler.next_event().await, SchedulerEvent::Tick));
        assert_eq!(start.elapsed(), Duration::from_secs(160));
        assert!(matches!(scheduler.next_event().await, SchedulerEvent::Tick));
        assert_eq!(start.elapsed(), Duration::from_secs(220));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_period_is_capped() {
        let start = Instant::now();
        let mut scheduler = PingScheduler::new(Duration::from_secs(u64::MAX));
        scheduler.reconfigure(Duration::from_secs(u64::MAX));
        assert_eq!(scheduler.period(), MAX_INTERVAL);

        assert!(matches!(scheduler.next_event().await, SchedulerEvent::Tick));
        assert_eq!(start.elapsed(), MAX_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_does_not_interrupt_batch() {
        let pinger = SlowPinger::new(Duration::from_secs(30));
        let mut scheduler = PingScheduler::new(Duration::from_secs(300));

        scheduler.start_batch(pinger.clone(), drives(3));
        sleep(Duration::from_secs(10)).await;
        scheduler.reconfigure(Duration::from_secs(60));
        assert_eq!(scheduler.state(), SchedulerState::Running);

        match scheduler.next_event().await {
            SchedulerEvent::BatchFinished(report) => assert_eq!(report.completed.len(), 3),
            other => panic!("Expected BatchFinished, got {:?}", other),
        }
    }
}

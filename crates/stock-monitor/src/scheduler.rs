//! Periodic job runner with start/stop control.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Work run on every tick.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    async fn run(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct Inner {
    state: SchedulerState,
    stop_tx: Option<watch::Sender<bool>>,
}

/// Runs a [`Job`] once per interval on a background task.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct Scheduler {
    job: Arc<dyn Job>,
    interval: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl Scheduler {
    pub fn new(job: Arc<dyn Job>, interval: Duration) -> Self {
        Self {
            job,
            interval,
            inner: Arc::new(Mutex::new(Inner {
                state: SchedulerState::Stopped,
                stop_tx: None,
            })),
        }
    }

    /// Start ticking. Returns `false` if already running.
    pub fn start(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.state == SchedulerState::Running {
            info!("Scheduler already running");
            return false;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        inner.stop_tx = Some(stop_tx);
        inner.state = SchedulerState::Running;

        tokio::spawn(run_loop(self.job.clone(), self.interval, stop_rx));
        info!(interval_secs = self.interval.as_secs(), "Scheduler started");
        true
    }

    /// Stop ticking. A run in progress completes. Returns `false` if not running.
    pub fn stop(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.state == SchedulerState::Stopped {
            info!("Scheduler not running");
            return false;
        }

        if let Some(stop_tx) = inner.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        inner.state = SchedulerState::Stopped;
        info!("Scheduler stopped");
        true
    }

    pub fn state(&self) -> SchedulerState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

async fn run_loop(job: Arc<dyn Job>, interval: Duration, mut stop_rx: watch::Receiver<bool>) {
    loop {
        if *stop_rx.borrow() {
            break;
        }

        // A panicking job must not kill the loop.
        let tick = job.clone();
        if let Err(e) = tokio::spawn(async move { tick.run().await }).await {
            error!("Scheduled job failed: {}", e);
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
    debug!("Scheduler loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingJob {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl Job for CountingJob {
        async fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingJob {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl Job for PanickingJob {
        async fn run(&self) {
            let n = self.runs.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                panic!("first run fails");
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_every_interval() {
        let job = Arc::new(CountingJob::default());
        let scheduler = Scheduler::new(job.clone(), Duration::from_secs(2));

        assert!(scheduler.start());
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        // Ticks at 0s, 2s and 4s.
        assert_eq!(job.runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_are_idempotent() {
        let job = Arc::new(CountingJob::default());
        let scheduler = Scheduler::new(job.clone(), Duration::from_secs(2));

        assert!(!scheduler.stop());
        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        let runs = job.runs.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), runs);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let job = Arc::new(CountingJob::default());
        let scheduler = Scheduler::new(job.clone(), Duration::from_secs(2));

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop();
        assert!(scheduler.start());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(job.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_job_keeps_loop_alive() {
        let job = Arc::new(PanickingJob {
            runs: AtomicUsize::new(0),
        });
        let scheduler = Scheduler::new(job.clone(), Duration::from_secs(1));

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(job.runs.load(Ordering::SeqCst), 3);
        scheduler.stop();
    }
}

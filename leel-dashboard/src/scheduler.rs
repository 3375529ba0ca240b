//! Periodic refresh driver.
//!
//! `RefreshScheduler::start` spawns a task that runs one cycle immediately,
//! then one per period. The returned handle cancels future ticks and can
//! trigger out-of-band cycles without touching the cadence.

use crate::sync::{CycleOutcome, Synchronizer};
use crate::transport::Transport;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

pub struct RefreshScheduler<T> {
    sync: Synchronizer<T>,
    period: Duration,
}

impl<T: Transport> RefreshScheduler<T> {
    /// A zero `period` falls back to [`DEFAULT_REFRESH_INTERVAL`].
    pub fn new(sync: Synchronizer<T>, period: Duration) -> Self {
        let period = if period.is_zero() {
            warn!("refresh period is zero, using default");
            DEFAULT_REFRESH_INTERVAL
        } else {
            period
        };
        Self { sync, period }
    }

    /// Spawns the timer task. Must be called from within a tokio runtime.
    pub fn start(self) -> SchedulerHandle<T> {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let sync = self.sync.clone();
        let period = self.period;

        let task = tokio::spawn(async move {
            info!(period_ms = period.as_millis() as u64, "refresh scheduler started");
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    // also fires when the handle is dropped
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        // stopping must not wait on an in-flight cycle
                        let sync = sync.clone();
                        tokio::spawn(async move {
                            let outcome = sync.run_cycle().await;
                            debug!(?outcome, "scheduled cycle done");
                        });
                    }
                }
            }
            info!("refresh scheduler stopped");
        });

        SchedulerHandle { sync: self.sync, stop_tx, task }
    }
}

/// Owner of a running scheduler. Dropping it stops the timer.
pub struct SchedulerHandle<T> {
    sync: Synchronizer<T>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<T: Transport> SchedulerHandle<T> {
    /// Runs a cycle now, in its own task, leaving the timer untouched.
    /// Returns `None` once the scheduler was stopped.
    pub fn refresh_now(&self) -> Option<JoinHandle<CycleOutcome>> {
        if self.is_stopped() {
            return None;
        }
        let sync = self.sync.clone();
        Some(tokio::spawn(async move { sync.run_cycle().await }))
    }

    /// Cancels every future tick. Cycles already in flight are left to
    /// finish in their own tasks; their commits are the store's business.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Stops the timer and waits for the timer task to exit, without waiting
    /// on in-flight cycles.
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.task.await;
    }
}

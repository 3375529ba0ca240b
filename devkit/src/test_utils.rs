/*!
Test harness for the dashboard

Bundles a scripted backend with helpers to wait on asynchronous effects:
a state predicate becoming true, or a number of calls reaching an endpoint.
*/

use crate::backend_stub::MockBackend;
use anyhow::Result;
use leel_dashboard::{Dashboard, DashboardConfig, DashboardState, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

pub struct TestHarness {
    pub backend: MockBackend,
    pub config: DashboardConfig,
}

impl TestHarness {
    pub fn new(backend: MockBackend) -> Self {
        env_logger::try_init().ok(); // test logs

        Self {
            backend,
            config: DashboardConfig {
                // keep the timer out of the way unless a test wants it
                refresh_interval_ms: 60_000,
                ..DashboardConfig::default()
            },
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.config.refresh_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Activates a dashboard on the scripted backend.
    pub fn activate(&self) -> Dashboard<MockBackend> {
        Dashboard::activate(Arc::new(self.backend.clone()), &self.config)
    }

    /// Polls `check` against store snapshots until it holds.
    pub async fn wait_until<F>(&self, store: &StateStore, check: F) -> Result<DashboardState>
    where
        F: Fn(&DashboardState) -> bool,
    {
        let deadline = Instant::now() + DEFAULT_WAIT;
        loop {
            let state = store.snapshot();
            if check(&state) {
                return Ok(state);
            }
            if Instant::now() >= deadline {
                log::warn!("⏰ state condition not reached");
                anyhow::bail!("state condition not reached within {DEFAULT_WAIT:?}");
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Waits until `path` has been called at least `count` times.
    pub async fn wait_for_calls(&self, path: &str, count: usize) -> Result<()> {
        let deadline = Instant::now() + DEFAULT_WAIT;
        while self.backend.calls_to(path) < count {
            if Instant::now() >= deadline {
                anyhow::bail!(
                    "expected {count} calls to {path}, got {}",
                    self.backend.calls_to(path)
                );
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

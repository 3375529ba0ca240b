//! Dashboard lifecycle
//!
//! `Dashboard::activate` wires one store, one synchronizer, one detail loader
//! and a running scheduler around a shared transport. Everything the
//! presentation side does goes through this handle; `deactivate` tears it
//! down and detaches the store so in-flight work lands nowhere.

use crate::config::DashboardConfig;
use crate::detail::{DetailLoader, DetailOutcome};
use crate::error::Result;
use crate::jobs::{submit_job, JobDraft};
use crate::scheduler::{RefreshScheduler, SchedulerHandle};
use crate::state::StateStore;
use crate::sync::{CycleOutcome, Synchronizer};
use crate::transport::{HttpTransport, Transport};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub struct Dashboard<T: Transport> {
    transport: Arc<T>,
    store: StateStore,
    detail: DetailLoader<T>,
    scheduler: SchedulerHandle<T>,
}

impl Dashboard<HttpTransport> {
    /// Activates a dashboard talking HTTP to `config.backend_url`.
    pub fn connect(config: &DashboardConfig) -> Result<Self> {
        let config = config.clone().sanitized();
        let transport = HttpTransport::new(&config.backend_url, config.request_timeout())?;
        info!(backend = %transport.base_url(), "connecting to scheduler backend");
        Ok(Self::activate(Arc::new(transport), &config))
    }
}

impl<T: Transport> Dashboard<T> {
    /// Creates the state store and starts refreshing: the first cycle runs
    /// right away. Zero periods or limits in `config` fall back to defaults.
    /// Must be called from within a tokio runtime.
    pub fn activate(transport: Arc<T>, config: &DashboardConfig) -> Self {
        let config = config.clone().sanitized();
        let store = StateStore::new();
        let sync = Synchronizer::new(Arc::clone(&transport), store.clone());
        let detail =
            DetailLoader::new(Arc::clone(&transport), store.clone(), config.detail_execution_limit);
        let scheduler = RefreshScheduler::new(sync, config.refresh_interval()).start();
        info!("dashboard activated");
        Self { transport, store, detail, scheduler }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Out-of-band refresh. The periodic timer keeps its cadence.
    pub fn refresh(&self) -> Option<JoinHandle<CycleOutcome>> {
        self.scheduler.refresh_now()
    }

    /// Opens the detail view on `job_id` and starts loading it. Selecting
    /// another job while this load runs makes its result stale.
    pub fn select_job(&self, job_id: &str) -> Option<JoinHandle<DetailOutcome>> {
        if job_id.is_empty() || !self.store.is_active() {
            return None;
        }
        self.store.select(job_id);
        let detail = self.detail.clone();
        let job_id = job_id.to_string();
        Some(tokio::spawn(async move { detail.load_detail(&job_id).await }))
    }

    pub fn close_detail(&self) {
        self.detail.close();
    }

    /// Posts a new job; on success an immediate refresh picks it up.
    pub async fn create_job(&self, draft: &JobDraft) -> Result<Value> {
        let reply = submit_job(self.transport.as_ref(), draft).await?;
        if self.refresh().is_none() {
            debug!("job created after the scheduler stopped, no refresh");
        }
        Ok(reply)
    }

    /// Stops the timer and detaches the store. Cycles and detail loads
    /// still in flight complete without touching state.
    pub async fn deactivate(self) {
        self.store.deactivate();
        self.scheduler.shutdown().await;
        info!("dashboard deactivated");
    }
}

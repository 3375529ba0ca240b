//! Refresh cycles: health probe, then three concurrent fetches, then one
//! all-or-nothing commit.
//!
//! Each cycle takes a sequence number when it starts. The store only applies
//! the outcome of a cycle that started after the last applied one, so a slow
//! cycle can never overwrite the result of a cycle started later.

use crate::error::{DashboardError, Result};
use crate::health::HealthProbe;
use crate::models::{dedupe_by_key, ExecutionsBody, JobsBody, MetricsBody};
use crate::state::{CommitStatus, StateStore, SyncedData};
use crate::transport::{Endpoint, Transport};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a cycle ended, from the store's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Everything fetched and committed; connectivity is Online.
    Online,
    /// The cycle failed and Offline was committed.
    Offline,
    /// A later-started cycle was already applied; this result was dropped.
    Superseded,
    /// The dashboard was deactivated while the cycle was in flight.
    Detached,
}

pub struct Synchronizer<T> {
    transport: Arc<T>,
    probe: HealthProbe<T>,
    store: StateStore,
    next_seq: Arc<AtomicU64>,
}

impl<T> Clone for Synchronizer<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            probe: self.probe.clone(),
            store: self.store.clone(),
            next_seq: Arc::clone(&self.next_seq),
        }
    }
}

impl<T: Transport> Synchronizer<T> {
    pub fn new(transport: Arc<T>, store: StateStore) -> Self {
        Self {
            probe: HealthProbe::new(Arc::clone(&transport)),
            transport,
            store,
            next_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Runs one full cycle. Never fails: every error ends up as Offline plus
    /// a log line.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "refresh cycle started");

        let result = self.pull(seq).await;
        let online = result.is_ok();
        if let Err(err) = &result {
            warn!(seq, error = %err, "refresh cycle failed, backend marked offline");
        }

        match self.store.commit_cycle(seq, result) {
            CommitStatus::Applied if online => {
                info!(seq, "refresh cycle committed");
                CycleOutcome::Online
            }
            CommitStatus::Applied => CycleOutcome::Offline,
            CommitStatus::Superseded => {
                debug!(seq, "refresh cycle superseded by a newer one");
                CycleOutcome::Superseded
            }
            CommitStatus::Detached => {
                debug!(seq, "refresh cycle finished after deactivation");
                CycleOutcome::Detached
            }
        }
    }

    async fn pull(&self, seq: u64) -> Result<SyncedData> {
        if let Some(err) = self.probe.check().await.into_error() {
            return Err(err);
        }

        let (metrics, jobs, executions) = tokio::join!(
            self.fetch::<MetricsBody>(Endpoint::Metrics),
            self.fetch::<JobsBody>(Endpoint::Jobs),
            self.fetch::<ExecutionsBody>(Endpoint::Executions),
        );

        let metrics = metrics?
            .scheduler
            .ok_or_else(|| DashboardError::application("metrics response has no 'scheduler' field"))?;
        let jobs = dedupe_by_key(jobs?.jobs.unwrap_or_default(), "job", |job| job.job_id.as_str());
        let executions = executions?.executions.unwrap_or_default();

        debug!(seq, jobs = jobs.len(), executions = executions.len(), "resources fetched");
        Ok(SyncedData { metrics, jobs, executions })
    }

    async fn fetch<B: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<B> {
        let value: Value = self.transport.fetch(endpoint).await?;
        Ok(serde_json::from_value(value)?)
    }
}

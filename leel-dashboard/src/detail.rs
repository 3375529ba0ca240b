//! Job detail loading.
//!
//! A load captures the job id it targets and a request token when it
//! starts. The result is committed only if that job is still selected and no
//! newer load was issued meanwhile; anything else is dropped silently.

use crate::error::{DashboardError, Result};
use crate::models::{dedupe_by_key, ExecutionsBody, Job};
use crate::state::{CommitStatus, JobDetailView, StateStore};
use crate::transport::{Endpoint, Transport};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_EXECUTION_LIMIT: usize = 5;

/// What happened to one detail load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Loaded,
    /// Fetch failed; an error message is shown for the job.
    Failed,
    /// The selection moved on (or the view was closed) before completion.
    Stale,
    /// The job was not selected when the load was asked for.
    NotSelected,
    Detached,
}

pub struct DetailLoader<T> {
    transport: Arc<T>,
    store: StateStore,
    execution_limit: usize,
}

impl<T> Clone for DetailLoader<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            store: self.store.clone(),
            execution_limit: self.execution_limit,
        }
    }
}

impl<T: Transport> DetailLoader<T> {
    pub fn new(transport: Arc<T>, store: StateStore, execution_limit: usize) -> Self {
        Self { transport, store, execution_limit: execution_limit.max(1) }
    }

    /// Loads metadata and recent executions of `job_id`, which must be the
    /// current selection.
    pub async fn load_detail(&self, job_id: &str) -> DetailOutcome {
        if !self.store.is_active() {
            return DetailOutcome::Detached;
        }
        let Some(token) = self.store.begin_detail(job_id) else {
            debug!(job_id, "detail requested for a job that is not selected");
            return DetailOutcome::NotSelected;
        };

        let result = self.fetch(job_id).await;
        let failed = result.is_err();
        let result = result.map_err(|err| {
            warn!(job_id, error = %err, "failed to load job details");
            detail_message(&err)
        });

        match self.store.commit_detail(token, job_id, result) {
            CommitStatus::Applied if failed => DetailOutcome::Failed,
            CommitStatus::Applied => DetailOutcome::Loaded,
            CommitStatus::Superseded => {
                debug!(job_id, "dropping stale job details");
                DetailOutcome::Stale
            }
            CommitStatus::Detached => DetailOutcome::Detached,
        }
    }

    /// Closes the detail view; late results for it are discarded.
    pub fn close(&self) {
        self.store.clear_selection();
    }

    async fn fetch(&self, job_id: &str) -> Result<JobDetailView> {
        let (job, executions) = tokio::join!(
            self.transport.fetch(Endpoint::Job { job_id: job_id.to_string() }),
            self.transport.fetch(Endpoint::JobExecutions {
                job_id: job_id.to_string(),
                limit: self.execution_limit,
            }),
        );

        let job: Job = serde_json::from_value(job?)?;
        if job.job_id != job_id {
            return Err(DashboardError::application(format!(
                "backend returned job '{}' for '{job_id}'",
                job.job_id
            )));
        }
        let body: ExecutionsBody = serde_json::from_value(executions?)?;
        let mut recent = dedupe_by_key(body.executions.unwrap_or_default(), "execution", |exec| {
            exec.execution_id.as_str()
        });
        recent.truncate(self.execution_limit);

        Ok(JobDetailView { job_id: job_id.to_string(), job, recent_executions: recent })
    }
}

/// Human-readable message shown in place of the detail content.
fn detail_message(err: &DashboardError) -> String {
    match err {
        DashboardError::Status { status: 404 } => "Job not found".to_string(),
        DashboardError::Application(message) => message.clone(),
        other => format!("Failed to load job details: {other}"),
    }
}

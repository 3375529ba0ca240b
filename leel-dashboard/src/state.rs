//! StateStore - the single mutable state read by presentation layers
//!
//! Field ownership:
//! - connectivity / metrics / jobs / executions: written by the synchronizer,
//!   as one batch, guarded by the cycle sequence number
//! - detail: written by the detail loader, guarded by the selection and the
//!   latest detail request token
//! - selection: written by user interaction handlers
//!
//! Once deactivated, every commit is a no-op.

use crate::error::DashboardError;
use crate::models::{Execution, Job, MetricsSnapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectivityState {
    Online,
    #[default]
    Offline,
}

/// What the operator asked to look at, independent of loading progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub active_job_id: Option<String>,
    pub modal_open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobDetailView {
    /// Job id the detail was requested for.
    pub job_id: String,
    pub job: Job,
    /// Newest first, at most the configured limit.
    pub recent_executions: Vec<Execution>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading { job_id: String },
    Ready(JobDetailView),
    Failed { job_id: String, message: String },
}

impl DetailState {
    pub fn job_id(&self) -> &str {
        match self {
            DetailState::Loading { job_id } | DetailState::Failed { job_id, .. } => job_id,
            DetailState::Ready(view) => &view.job_id,
        }
    }
}

/// One successful refresh: the three resources committed together.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedData {
    pub metrics: MetricsSnapshot,
    pub jobs: Vec<Job>,
    pub executions: Vec<Execution>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub connectivity: ConnectivityState,
    pub metrics: Option<MetricsSnapshot>,
    pub jobs: Vec<Job>,
    pub executions: Vec<Execution>,
    /// True until the first cycle settles, successful or not.
    pub loading: bool,
    pub last_synced_at: Option<OffsetDateTime>,
    pub selection: Selection,
    pub detail: Option<DetailState>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            connectivity: ConnectivityState::Offline,
            metrics: None,
            jobs: Vec::new(),
            executions: Vec::new(),
            loading: true,
            last_synced_at: None,
            selection: Selection::default(),
            detail: None,
        }
    }
}

impl DashboardState {
    pub fn is_online(&self) -> bool {
        self.connectivity == ConnectivityState::Online
    }

    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.job_id == job_id)
    }

    /// Executions still pending or running.
    pub fn current_executions(&self) -> Vec<&Execution> {
        self.executions
            .iter()
            .filter(|exec| exec.status.is_in_progress())
            .collect()
    }
}

/// Why a commit was or was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Applied,
    /// A newer cycle or detail request already owns the slot.
    Superseded,
    /// The store was deactivated.
    Detached,
}

#[derive(Debug)]
struct StoreInner {
    state: DashboardState,
    active: bool,
    last_cycle: u64,
    detail_token: u64,
}

/// Shared handle on the dashboard state. Cheap to clone.
#[derive(Clone)]
pub struct StateStore {
    inner: Shared<StoreInner>,
    changes: Arc<watch::Sender<u64>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: new_state(StoreInner {
                state: DashboardState::default(),
                active: true,
                last_cycle: 0,
                detail_token: 0,
            }),
            changes: Arc::new(changes),
        }
    }

    pub fn snapshot(&self) -> DashboardState {
        self.inner.lock().state.clone()
    }

    /// Borrowing read, for callers that only need a few fields.
    pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.inner.lock().state)
    }

    /// Version counter bumped after every applied change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().active
    }

    /// Detaches the store: later commits are dropped. Bumps the version one
    /// last time so subscribers can notice.
    pub fn deactivate(&self) {
        {
            let mut inner = self.inner.lock();
            if !inner.active {
                return;
            }
            inner.active = false;
        }
        self.notify();
    }

    /// Applies the outcome of cycle `seq` unless a later-started cycle has
    /// already been applied. Success replaces metrics, jobs and executions in
    /// one step; failure only flips connectivity to Offline.
    pub fn commit_cycle(
        &self,
        seq: u64,
        result: std::result::Result<SyncedData, DashboardError>,
    ) -> CommitStatus {
        {
            let mut inner = self.inner.lock();
            if !inner.active {
                return CommitStatus::Detached;
            }
            if seq <= inner.last_cycle {
                return CommitStatus::Superseded;
            }
            inner.last_cycle = seq;
            let state = &mut inner.state;
            state.loading = false;
            match result {
                Ok(data) => {
                    state.connectivity = ConnectivityState::Online;
                    state.metrics = Some(data.metrics);
                    state.jobs = data.jobs;
                    state.executions = data.executions;
                    state.last_synced_at = Some(OffsetDateTime::now_utc());
                }
                Err(_) => state.connectivity = ConnectivityState::Offline,
            }
        }
        self.notify();
        CommitStatus::Applied
    }

    /// Opens the detail view on `job_id`. The detail switches to Loading for
    /// that job in the same step, and loads issued before are made stale.
    pub fn select(&self, job_id: &str) {
        {
            let mut inner = self.inner.lock();
            if !inner.active {
                return;
            }
            inner.detail_token += 1;
            inner.state.selection = Selection {
                active_job_id: Some(job_id.to_string()),
                modal_open: true,
            };
            inner.state.detail = Some(DetailState::Loading { job_id: job_id.to_string() });
        }
        self.notify();
    }

    /// Closes the detail view. In-flight detail loads become stale.
    pub fn clear_selection(&self) {
        {
            let mut inner = self.inner.lock();
            if !inner.active {
                return;
            }
            inner.detail_token += 1;
            inner.state.selection = Selection::default();
            inner.state.detail = None;
        }
        self.notify();
    }

    /// Starts a detail load for the selected job and returns its token, or
    /// `None` when `job_id` is not the current selection.
    pub fn begin_detail(&self, job_id: &str) -> Option<u64> {
        let token = {
            let mut inner = self.inner.lock();
            if !inner.active || !is_selected(&inner.state.selection, job_id) {
                return None;
            }
            inner.detail_token += 1;
            inner.state.detail = Some(DetailState::Loading { job_id: job_id.to_string() });
            inner.detail_token
        };
        self.notify();
        Some(token)
    }

    /// Commits a detail result if `token` is still the latest request and
    /// `job_id` is still selected.
    pub fn commit_detail(
        &self,
        token: u64,
        job_id: &str,
        result: std::result::Result<JobDetailView, String>,
    ) -> CommitStatus {
        {
            let mut inner = self.inner.lock();
            if !inner.active {
                return CommitStatus::Detached;
            }
            if token != inner.detail_token || !is_selected(&inner.state.selection, job_id) {
                return CommitStatus::Superseded;
            }
            inner.state.detail = Some(match result {
                Ok(view) => DetailState::Ready(view),
                Err(message) => DetailState::Failed { job_id: job_id.to_string(), message },
            });
        }
        self.notify();
        CommitStatus::Applied
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}

fn is_selected(selection: &Selection, job_id: &str) -> bool {
    selection.modal_open && selection.active_job_id.as_deref() == Some(job_id)
}

//! Leel dashboard - data synchronization engine for the job scheduler UI
//!
//! Keeps a local view of the scheduler backend (health, metrics, jobs,
//! executions) fresh on a timer, loads job details on demand and posts new
//! jobs. Presentation layers read [`StateStore`] snapshots and subscribe to
//! its change counter.

pub mod config;
pub mod dashboard;
pub mod detail;
pub mod error;
pub mod health;
pub mod jobs;
pub mod models;
pub mod scheduler;
pub mod state;
pub mod sync;
pub mod transport;

pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use detail::{DetailLoader, DetailOutcome};
pub use error::{DashboardError, Result};
pub use health::{HealthOutcome, HealthProbe};
pub use jobs::{submit_job, JobDraft};
pub use models::{Execution, ExecutionStatus, Job, JobStats, MetricsSnapshot};
pub use scheduler::{RefreshScheduler, SchedulerHandle};
pub use state::{
    CommitStatus, ConnectivityState, DashboardState, DetailState, JobDetailView, Selection,
    StateStore, SyncedData,
};
pub use sync::{CycleOutcome, Synchronizer};
pub use transport::{Endpoint, HttpTransport, Transport};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use time::OffsetDateTime;

/// A job registered on the scheduler backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: String,
    #[serde(default)]
    pub schedule: String, // cron-like, never interpreted here
    #[serde(default)]
    pub api: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<JobStats>,
}

fn default_active() -> bool {
    true
}

impl Job {
    /// Truncated id used by list views.
    pub fn short_id(&self) -> &str {
        match self.job_id.char_indices().nth(8) {
            Some((idx, _)) => &self.job_id[..idx],
            None => &self.job_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_duration: Option<f64>,
}

impl JobStats {
    /// Share of successful runs in [0, 1], `None` before the first run.
    pub fn success_rate(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.success as f64 / self.total as f64)
    }
}

/// One run (or scheduled run) of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub execution_id: String,
    pub job_id: String,
    #[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<OffsetDateTime>,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>, // ms
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Execution status as reported by the backend.
///
/// Matching is case-insensitive; unknown values are kept verbatim instead of
/// failing the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Pending,
    Running,
    Other(String),
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Other(raw) => raw,
        }
    }

    /// Pending or running, i.e. not settled yet.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, ExecutionStatus::Pending | ExecutionStatus::Running)
    }
}

impl From<String> for ExecutionStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "success" | "succeeded" => ExecutionStatus::Success,
            "failed" | "failure" => ExecutionStatus::Failed,
            "pending" | "queued" => ExecutionStatus::Pending,
            "running" => ExecutionStatus::Running,
            _ => ExecutionStatus::Other(raw),
        }
    }
}

impl From<ExecutionStatus> for String {
    fn from(status: ExecutionStatus) -> Self {
        match status {
            ExecutionStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduler-side counters. Opaque to the dashboard, replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsSnapshot(pub Value);

impl MetricsSnapshot {
    /// Numeric counter at the top level of the snapshot, e.g. `queued`.
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.0.get(name).and_then(Value::as_u64)
    }
}

// Response envelopes. Absent or null lists are read as empty.

#[derive(Debug, Deserialize)]
pub(crate) struct HealthBody {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetricsBody {
    #[serde(default)]
    pub scheduler: Option<MetricsSnapshot>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobsBody {
    #[serde(default)]
    pub jobs: Option<Vec<Job>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExecutionsBody {
    #[serde(default)]
    pub executions: Option<Vec<Execution>>,
}

/// Drops items whose key was already seen, keeping the first occurrence.
pub(crate) fn dedupe_by_key<T, F>(items: Vec<T>, what: &str, key: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| seen.insert(key(item).to_string()))
        .collect();
    if kept.len() != before {
        tracing::warn!(dropped = before - kept.len(), "duplicate {what} ids in backend response");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_job_parses() {
        let job: Job = serde_json::from_value(json!({
            "jobId": "j1",
            "schedule": "*/5 * * * *",
            "api": "https://x",
            "active": true
        }))
        .unwrap();
        assert_eq!(job.job_id, "j1");
        assert!(job.job_type.is_none());
        assert!(job.created_at.is_none());
        assert!(job.stats.is_none());
    }

    #[test]
    fn test_full_job_parses() {
        let job: Job = serde_json::from_value(json!({
            "jobId": "0b7c3f7e-4a61-4b0e-9d1c-5f7a8e2d9c10",
            "schedule": "0 * * * *",
            "api": "https://example.org/hook",
            "type": "ATLEAST_ONCE",
            "createdAt": "2024-05-01T12:30:00.000Z",
            "active": false,
            "stats": { "total": 4, "success": 3, "failed": 1, "avgDuration": 120.5 }
        }))
        .unwrap();
        assert_eq!(job.job_type.as_deref(), Some("ATLEAST_ONCE"));
        assert_eq!(job.created_at.unwrap().year(), 2024);
        assert!(!job.active);
        assert_eq!(job.short_id(), "0b7c3f7e");
        assert_eq!(job.stats.unwrap().success_rate(), Some(0.75));
    }

    #[test]
    fn test_short_id_on_short_ids() {
        let job: Job = serde_json::from_value(json!({ "jobId": "j1" })).unwrap();
        assert_eq!(job.short_id(), "j1");
        assert!(job.active);
    }

    #[test]
    fn test_execution_status_is_case_insensitive() {
        let exec: Execution = serde_json::from_value(json!({
            "executionId": "e1",
            "jobId": "j1",
            "scheduledTime": "2024-05-01T12:30:00Z",
            "status": "success",
            "httpStatus": 200,
            "duration": 42,
            "retryCount": 1
        }))
        .unwrap();
        assert_eq!(exec.status, ExecutionStatus::Success);
        assert_eq!(exec.http_status, Some(200));
        assert_eq!(exec.duration, Some(42.0));

        assert_eq!(ExecutionStatus::from("RUNNING".to_string()), ExecutionStatus::Running);
        assert_eq!(
            ExecutionStatus::from("Skipped".to_string()),
            ExecutionStatus::Other("Skipped".into())
        );
        assert!(ExecutionStatus::Pending.is_in_progress());
        assert!(!ExecutionStatus::Failed.is_in_progress());
    }

    #[test]
    fn test_envelopes_treat_null_as_empty() {
        let body: JobsBody = serde_json::from_value(json!({ "jobs": null })).unwrap();
        assert!(body.jobs.is_none());
        let body: ExecutionsBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.executions.is_none());
        let body: MetricsBody = serde_json::from_value(json!({ "scheduler": { "queued": 3 } })).unwrap();
        assert_eq!(body.scheduler.unwrap().counter("queued"), Some(3));
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let ids = vec!["a", "b", "a", "c", "b"];
        let kept = dedupe_by_key(ids, "test", |s| *s);
        assert_eq!(kept, vec!["a", "b", "c"]);
    }
}

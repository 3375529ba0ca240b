//! Job creation, the only write the dashboard performs.

use crate::error::{DashboardError, Result};
use crate::transport::{Endpoint, Transport};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// Job definition as entered by the operator. Fields the backend accepts
/// beyond the three known ones travel in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub schedule: String,
    pub api: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobDraft {
    pub fn new(schedule: impl Into<String>, api: impl Into<String>) -> Self {
        Self { schedule: schedule.into(), api: api.into(), ..Self::default() }
    }

    pub fn with_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = Some(job_type.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.schedule.trim().is_empty() {
            return Err(DashboardError::application("job schedule must not be empty"));
        }
        if self.api.trim().is_empty() {
            return Err(DashboardError::application("job api must not be empty"));
        }
        Ok(())
    }
}

/// Validates and posts `draft`. Returns the backend's reply body as is.
pub async fn submit_job<T: Transport>(transport: &T, draft: &JobDraft) -> Result<Value> {
    draft.validate()?;
    let body = serde_json::to_value(draft)?;
    let reply = transport.submit(Endpoint::CreateJob, body).await?;
    info!(schedule = %draft.schedule, api = %draft.api, "job created");
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        submitted: Mutex<Vec<(Endpoint, Value)>>,
    }

    impl Transport for Recorder {
        async fn fetch(&self, _endpoint: Endpoint) -> Result<Value> {
            Err(DashboardError::application("write-only"))
        }

        async fn submit(&self, endpoint: Endpoint, body: Value) -> Result<Value> {
            self.submitted.lock().push((endpoint, body));
            Ok(json!({ "jobId": "new-job" }))
        }
    }

    #[test]
    fn test_validation() {
        assert!(JobDraft::new("*/5 * * * *", "https://svc/ping").validate().is_ok());
        assert!(JobDraft::new("  ", "https://svc/ping").validate().is_err());
        assert!(matches!(
            JobDraft::new("*/5 * * * *", "").validate(),
            Err(DashboardError::Application(_))
        ));
    }

    #[test]
    fn test_wire_shape() {
        let mut draft = JobDraft::new("0 * * * *", "https://svc/run").with_type("ATLEAST_ONCE");
        draft.extra.insert("retries".into(), json!(3));
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            json!({ "schedule": "0 * * * *", "api": "https://svc/run", "type": "ATLEAST_ONCE", "retries": 3 })
        );
        let untyped = serde_json::to_value(JobDraft::new("0 * * * *", "https://svc/run")).unwrap();
        assert!(untyped.get("type").is_none());
    }

    #[tokio::test]
    async fn test_submit_posts_draft() {
        let transport = Recorder::default();
        let reply = submit_job(&transport, &JobDraft::new("0 * * * *", "https://svc/run"))
            .await
            .unwrap();
        assert_eq!(reply["jobId"], "new-job");
        let submitted = transport.submitted.lock();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0, Endpoint::CreateJob);
        assert_eq!(submitted[0].1["api"], "https://svc/run");
    }

    #[tokio::test]
    async fn test_invalid_draft_is_never_sent() {
        let transport = Recorder::default();
        let err = submit_job(&transport, &JobDraft::default()).await.unwrap_err();
        assert!(matches!(err, DashboardError::Application(_)));
        assert!(transport.submitted.lock().is_empty());
    }
}

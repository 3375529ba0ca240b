/*!
Builders for backend responses

JSON builders shaped like the scheduler backend's answers, so tests do not
repeat field names.
*/

use serde_json::{json, Value};

pub fn health(status: &str) -> Value {
    json!({ "status": status, "timestamp": chrono::Utc::now().to_rfc3339() })
}

/// Metrics answer with a few scheduler counters.
pub fn metrics(queued: u64, running: u64, completed: u64) -> Value {
    json!({
        "scheduler": {
            "queuedExecutions": queued,
            "runningExecutions": running,
            "completedExecutions": completed
        }
    })
}

pub fn jobs_body(jobs: Vec<Value>) -> Value {
    json!({ "jobs": jobs })
}

pub fn executions_body(executions: Vec<Value>) -> Value {
    json!({ "executions": executions })
}

/// Builder for one job record.
#[derive(Debug, Clone)]
pub struct JobBuilder {
    value: Value,
}

impl JobBuilder {
    pub fn new(job_id: &str) -> Self {
        Self {
            value: json!({
                "jobId": job_id,
                "schedule": "*/5 * * * *",
                "api": format!("https://service.local/{job_id}"),
                "type": "ATLEAST_ONCE",
                "createdAt": chrono::Utc::now().to_rfc3339(),
                "active": true
            }),
        }
    }

    pub fn schedule(self, schedule: &str) -> Self {
        self.set("schedule", json!(schedule))
    }

    pub fn inactive(self) -> Self {
        self.set("active", json!(false))
    }

    pub fn stats(self, total: u64, success: u64, failed: u64) -> Self {
        self.set("stats", json!({ "total": total, "success": success, "failed": failed }))
    }

    pub fn set(mut self, field: &str, value: Value) -> Self {
        if let Value::Object(ref mut obj) = self.value {
            obj.insert(field.to_string(), value);
        }
        self
    }

    pub fn build(self) -> Value {
        self.value
    }
}

pub fn job(job_id: &str) -> Value {
    JobBuilder::new(job_id).build()
}

pub fn execution(execution_id: &str, job_id: &str, status: &str) -> Value {
    json!({
        "executionId": execution_id,
        "jobId": job_id,
        "scheduledTime": chrono::Utc::now().to_rfc3339(),
        "status": status,
        "httpStatus": if status == "SUCCESS" { json!(200) } else { Value::Null },
        "duration": 0.25,
        "retryCount": 0
    })
}

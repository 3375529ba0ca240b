/*!
Scripted backend for development without a scheduler

Implements the dashboard `Transport` seam in memory. Replies are scripted per
endpoint path, every call is recorded, and a call can be held on a gate so a
test decides exactly when (and in which order) responses come back.
*/

use leel_dashboard::{DashboardError, Endpoint, Transport};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub endpoint: Endpoint,
    pub body: Option<Value>,
}

impl RecordedCall {
    pub fn path(&self) -> String {
        self.endpoint.path()
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Json(Value),
    Fail(DashboardError),
}

#[derive(Default)]
struct Script {
    replies: HashMap<String, Reply>,
    gates: HashMap<String, VecDeque<oneshot::Receiver<()>>>,
    calls: Vec<RecordedCall>,
}

/// Releases one held call. Dropping it releases the call too.
pub struct Gate {
    tx: oneshot::Sender<()>,
}

impl Gate {
    pub fn release(self) {
        let _ = self.tx.send(());
    }
}

/// Scripted in-memory backend. Clones share the same script.
#[derive(Clone, Default)]
pub struct MockBackend {
    script: Arc<Mutex<Script>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend answering healthy with the given jobs and executions.
    pub fn healthy(jobs: Vec<Value>, executions: Vec<Value>) -> Self {
        let backend = Self::new();
        backend.reply("/health", crate::fixtures::health("healthy"));
        backend.reply("/api/metrics", crate::fixtures::metrics(0, 0, 0));
        backend.reply("/api/jobs", crate::fixtures::jobs_body(jobs));
        backend.reply("/api/executions", crate::fixtures::executions_body(executions));
        backend
    }

    /// Scripts the JSON answer for `path` (e.g. `/api/jobs/j1`).
    pub fn reply(&self, path: &str, body: Value) -> &Self {
        self.script.lock().replies.insert(path.to_string(), Reply::Json(body));
        self
    }

    /// Makes every call to `path` fail with `err`.
    pub fn fail(&self, path: &str, err: DashboardError) -> &Self {
        self.script.lock().replies.insert(path.to_string(), Reply::Fail(err));
        self
    }

    /// Holds the next call to `path` until the returned gate is released.
    /// The reply is chosen when the call starts, not when it is released.
    pub fn hold(&self, path: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.script.lock().gates.entry(path.to_string()).or_default().push_back(rx);
        Gate { tx }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().calls.clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.script.lock().calls.iter().filter(|call| call.path() == path).count()
    }

    pub fn clear_calls(&self) {
        self.script.lock().calls.clear();
    }

    async fn answer(&self, method: Method, endpoint: Endpoint, body: Option<Value>) -> Result<Value, DashboardError> {
        let path = endpoint.path();
        let (reply, gate) = {
            let mut script = self.script.lock();
            script.calls.push(RecordedCall { method, endpoint, body });
            let gate = script.gates.get_mut(&path).and_then(|gates| gates.pop_front());
            (script.replies.get(&path).cloned(), gate)
        };
        log::debug!("[mock] {method:?} {path}");

        if let Some(gate) = gate {
            // a dropped gate counts as released
            let _ = gate.await;
        }

        match reply {
            Some(Reply::Json(value)) => Ok(value),
            Some(Reply::Fail(err)) => Err(err),
            None => Err(DashboardError::Status { status: 404 }),
        }
    }
}

impl Transport for MockBackend {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value, DashboardError> {
        self.answer(Method::Get, endpoint, None).await
    }

    async fn submit(&self, endpoint: Endpoint, body: Value) -> Result<Value, DashboardError> {
        self.answer(Method::Post, endpoint, Some(body)).await
    }
}

//! HTTP transport to the scheduler backend
//!
//! ROLE: the only component that touches the network. Every request goes to
//! one of a fixed set of backend endpoints and yields either a parsed JSON
//! value or a `DashboardError`; a timeout or a non-2xx answer is a failure,
//! never a partial value.
//!
//! The `Transport` trait is the seam used by the probe, the synchronizer and
//! the detail loader, so tests and the devkit can script the backend.

use crate::error::{DashboardError, Result};
use reqwest::{Client, Url};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Backend resources the dashboard knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    Metrics,
    Jobs,
    Executions,
    Job { job_id: String },
    JobExecutions { job_id: String, limit: usize },
    CreateJob,
}

impl Endpoint {
    fn segments(&self) -> Vec<&str> {
        match self {
            Endpoint::Health => vec!["health"],
            Endpoint::Metrics => vec!["api", "metrics"],
            Endpoint::Jobs | Endpoint::CreateJob => vec!["api", "jobs"],
            Endpoint::Executions => vec!["api", "executions"],
            Endpoint::Job { job_id } => vec!["api", "jobs", job_id.as_str()],
            Endpoint::JobExecutions { job_id, .. } => vec!["api", "jobs", job_id.as_str(), "executions"],
        }
    }

    /// Path without query string, e.g. `/api/jobs/j1/executions`.
    ///
    /// Used as a routing key by stubs; the HTTP transport percent-encodes
    /// each segment separately.
    pub fn path(&self) -> String {
        let mut path = String::new();
        for segment in self.segments() {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::JobExecutions { limit, .. } => vec![("limit", limit.to_string())],
            _ => Vec::new(),
        }
    }
}

/// Request/response access to the backend.
///
/// Implementations are stateless apart from connection reuse and must
/// surface every failure as an `Err`.
pub trait Transport: Send + Sync + 'static {
    /// GET a resource and parse its JSON body.
    fn fetch(&self, endpoint: Endpoint) -> impl Future<Output = Result<Value>> + Send;

    /// POST a JSON body and parse the JSON answer.
    fn submit(&self, endpoint: Endpoint, body: Value) -> impl Future<Output = Result<Value>> + Send;
}

/// `Transport` over HTTP with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| DashboardError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("leel-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DashboardError::Network(e.to_string()))?;
        Ok(Self { client, base_url, timeout })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for an endpoint, keeping any path prefix of the base URL.
    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(endpoint.segments());
        let query = endpoint.query();
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn map_error(&self, err: reqwest::Error) -> DashboardError {
        if err.is_timeout() {
            DashboardError::Timeout(self.timeout)
        } else {
            DashboardError::Network(err.to_string())
        }
    }

    async fn read_json(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status { status: status.as_u16() });
        }
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl Transport for HttpTransport {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value> {
        let url = self.url_for(&endpoint)?;
        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| self.map_error(e))?;
        self.read_json(response).await
    }

    async fn submit(&self, endpoint: Endpoint, body: Value) -> Result<Value> {
        let url = self.url_for(&endpoint)?;
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;
        self.read_json(response).await
    }
}

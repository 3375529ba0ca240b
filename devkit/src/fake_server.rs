/*!
Fake HTTP backend on loopback

Serves canned answers per path on 127.0.0.1 with an ephemeral port, so the
real `HttpTransport` can be exercised end to end: status codes, broken
bodies and slow answers included. Requests are recorded with their query
string and body.
*/

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl CannedResponse {
    pub fn json(body: &Value) -> Self {
        Self { status: 200, body: body.to_string(), delay: None }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: String::new(), delay: None }
    }

    /// 200 with a body that is not JSON.
    pub fn raw(body: &str) -> Self {
        Self { status: 200, body: body.to_string(), delay: None }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ServedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct ServerState {
    routes: Mutex<HashMap<String, CannedResponse>>,
    requests: Mutex<Vec<ServedRequest>>,
}

/// Fake scheduler backend. Stops when dropped.
pub struct FakeBackendServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    task: JoinHandle<()>,
}

impl FakeBackendServer {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(ServerState::default());
        let app = Router::new().fallback(serve).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::warn!("[fake-backend] server stopped: {e}");
            }
        });
        log::info!("[fake-backend] listening on http://{addr}");
        Ok(Self { addr, state, task })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn route(&self, path: &str, response: CannedResponse) -> &Self {
        self.state.routes.lock().insert(path.to_string(), response);
        self
    }

    pub fn json(&self, path: &str, body: Value) -> &Self {
        self.route(path, CannedResponse::json(&body))
    }

    pub fn requests(&self) -> Vec<ServedRequest> {
        self.state.requests.lock().clone()
    }
}

impl Drop for FakeBackendServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(State(state): State<Arc<ServerState>>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    state.requests.lock().push(ServedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    });

    let canned = state.routes.lock().get(&path).cloned();
    let Some(canned) = canned else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }
    let status = StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], canned.body).into_response()
}

/*!
# Leel DevKit - Stubs and utilities for dashboard development

Lets the dashboard run and be tested without a real scheduler backend:
- Scripted in-memory backend implementing the `Transport` seam
- Fake HTTP backend (axum) for the real `HttpTransport`
- JSON builders for backend answers
- Test harness with polling helpers
*/

pub mod backend_stub;
pub mod fake_server;
pub mod fixtures;
pub mod test_utils;

pub use backend_stub::{Gate, Method, MockBackend, RecordedCall};
pub use fake_server::{CannedResponse, FakeBackendServer, ServedRequest};
pub use fixtures::JobBuilder;
pub use test_utils::TestHarness;

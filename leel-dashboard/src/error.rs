//! Error taxonomy shared by every component of the dashboard.
//!
//! - Network failures: backend unreachable, timed out, or answering non-2xx
//! - Parse failures: a body that is not the JSON shape we expect
//! - Application failures: the backend answered, but says something we
//!   cannot accept (non-healthy status, missing fields, invalid job draft)

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardError {
    #[error("backend unreachable: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("backend answered HTTP {status}")]
    Status { status: u16 },
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("{0}")]
    Application(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
}

impl DashboardError {
    /// Unreachable, timed out, non-2xx or misconfigured endpoint.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            DashboardError::Network(_)
                | DashboardError::Timeout(_)
                | DashboardError::Status { .. }
                | DashboardError::InvalidUrl(_)
        )
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, DashboardError::Parse(_))
    }

    pub fn application(message: impl Into<String>) -> Self {
        DashboardError::Application(message.into())
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy() {
        assert!(DashboardError::Timeout(Duration::from_secs(1)).is_network());
        assert!(DashboardError::Status { status: 503 }.is_network());
        assert!(!DashboardError::Parse("eof".into()).is_network());
        assert!(DashboardError::Parse("eof".into()).is_parse());
        assert!(!DashboardError::application("degraded").is_network());
    }

    #[test]
    fn test_json_errors_become_parse_errors() {
        let err: DashboardError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_parse());
    }
}

use crate::error::DashboardError;
use crate::models::HealthBody;
use crate::transport::{Endpoint, Transport};
use std::sync::Arc;
use tracing::debug;

pub const HEALTHY: &str = "healthy";

/// Result of one health probe. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthOutcome {
    Healthy,
    /// The backend answered with a status other than `healthy`.
    Degraded(String),
    /// The probe itself failed (network, timeout, malformed body).
    Unreachable(DashboardError),
}

impl HealthOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthOutcome::Healthy)
    }

    /// Error equivalent of a non-healthy outcome.
    pub fn into_error(self) -> Option<DashboardError> {
        match self {
            HealthOutcome::Healthy => None,
            HealthOutcome::Degraded(status) => {
                Some(DashboardError::application(format!("backend reports status '{status}'")))
            }
            HealthOutcome::Unreachable(err) => Some(err),
        }
    }
}

/// Reduces the backend health endpoint to a reachability signal.
pub struct HealthProbe<T> {
    transport: Arc<T>,
}

impl<T> Clone for HealthProbe<T> {
    fn clone(&self) -> Self {
        Self { transport: Arc::clone(&self.transport) }
    }
}

impl<T: Transport> HealthProbe<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub async fn check(&self) -> HealthOutcome {
        let outcome = match self.transport.fetch(Endpoint::Health).await {
            Ok(value) => match serde_json::from_value::<HealthBody>(value) {
                Ok(HealthBody { status: Some(status) }) if status == HEALTHY => HealthOutcome::Healthy,
                Ok(HealthBody { status }) => {
                    HealthOutcome::Degraded(status.unwrap_or_else(|| "missing".to_string()))
                }
                Err(e) => HealthOutcome::Unreachable(e.into()),
            },
            Err(e) => HealthOutcome::Unreachable(e),
        };
        match &outcome {
            HealthOutcome::Healthy => {}
            HealthOutcome::Degraded(status) => debug!(status = %status, "backend not healthy"),
            HealthOutcome::Unreachable(err) => debug!(error = %err, "health probe failed"),
        }
        outcome
    }
}

use crate::detail::DEFAULT_EXECUTION_LIMIT;
use crate::scheduler::DEFAULT_REFRESH_INTERVAL;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_PATH_VAR: &str = "LEEL_DASHBOARD_CONFIG";
pub const BACKEND_URL_VAR: &str = "LEEL_BACKEND_URL";
pub const DEFAULT_CONFIG_PATH: &str = "dashboard.yaml";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid config {path}: {source}")]
    Yaml { path: String, source: serde_yaml::Error },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub backend_url: String,
    pub refresh_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub detail_execution_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            detail_execution_limit: DEFAULT_EXECUTION_LIMIT,
        }
    }
}

impl DashboardConfig {
    /// Reads the file named by `LEEL_DASHBOARD_CONFIG` (or `dashboard.yaml`).
    /// A missing or invalid file falls back to defaults with a log line.
    pub async fn load() -> Self {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let config = if Path::new(&path).exists() {
            Self::load_from_path(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "config invalid, using defaults");
                Self::default()
            })
        } else {
            info!(path = %path, "no config file, using defaults");
            Self::default()
        };
        config.with_env_overrides()
    }

    /// Strict variant of [`DashboardConfig::load`] for a known file.
    pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let txt = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed: Self = serde_yaml::from_str(&txt).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
        Ok(parsed.sanitized())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BACKEND_URL_VAR) {
            if !url.trim().is_empty() {
                self.backend_url = url;
            }
        }
        self
    }

    /// Zero periods and limits make no sense; put the defaults back.
    pub(crate) fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.backend_url.trim().is_empty() {
            warn!("backend_url is empty, using default");
            self.backend_url = defaults.backend_url;
        }
        if self.refresh_interval_ms == 0 {
            warn!("refresh_interval_ms is 0, using default");
            self.refresh_interval_ms = defaults.refresh_interval_ms;
        }
        if self.request_timeout_ms == 0 {
            warn!("request_timeout_ms is 0, using default");
            self.request_timeout_ms = defaults.request_timeout_ms;
        }
        if self.detail_execution_limit == 0 {
            warn!("detail_execution_limit is 0, using default");
            self.detail_execution_limit = defaults.detail_execution_limit;
        }
        self
    }
}

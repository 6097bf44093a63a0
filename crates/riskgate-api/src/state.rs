//! # Application State
//!
//! Shared state handed to every route handler via the `State` extractor.
//! The orchestrator is cheap to clone and serves concurrent assessments;
//! nothing here is mutated per request apart from metrics counters.

use riskgate_pipeline::PipelineOrchestrator;

use crate::middleware::metrics::ApiMetrics;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5005;

/// Service name reported by `/` and `/api/health`.
pub const SERVICE_NAME: &str = "riskgate";

/// Transport configuration.
///
/// Custom `Debug` redacts the auth token.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub auth_token: Option<String>,
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            auth_token: None,
            metrics_enabled: true,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

impl AppConfig {
    /// Variables: `PORT` (default 5005), `RISKGATE_AUTH_TOKEN`,
    /// `RISKGATE_METRICS_ENABLED` (anything but `false` enables).
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            auth_token: std::env::var("RISKGATE_AUTH_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            metrics_enabled: std::env::var("RISKGATE_METRICS_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: PipelineOrchestrator,
    pub config: AppConfig,
    pub metrics: ApiMetrics,
}

impl AppState {
    pub fn new(
        orchestrator: PipelineOrchestrator,
        config: AppConfig,
    ) -> Result<Self, prometheus::Error> {
        Ok(Self {
            orchestrator,
            config,
            metrics: ApiMetrics::new()?,
        })
    }
}

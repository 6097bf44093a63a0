//! Registry client configuration.
//!
//! Defaults point at a registry on localhost. Override via environment
//! variables or explicit construction for staging/testing.

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

/// Default retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Retries are capped here whatever the environment says.
pub const MAX_RETRIES_CAP: u32 = 5;

/// Default base delay between retries; doubles per attempt.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 200;

/// Configuration for connecting to the risk/control registry.
///
/// Custom `Debug` implementation redacts the `api_token` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct RegistryConfig {
    /// Base URL of the registry REST API.
    /// Default: <http://localhost:5001>
    pub base_url: Url,
    /// Optional bearer token. Zeroized on drop.
    pub api_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after the first attempt on transport errors and 429/5xx.
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    pub retry_base_delay_ms: u64,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .finish()
    }
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `RISKGATE_REGISTRY_URL` (default: `http://localhost:5001`)
    /// - `RISKGATE_REGISTRY_TOKEN` (optional)
    /// - `RISKGATE_REGISTRY_TIMEOUT_SECS` (default: 30)
    /// - `RISKGATE_REGISTRY_RETRIES` (default: 3, at most 5)
    /// - `RISKGATE_REGISTRY_RETRY_DELAY_MS` (default: 200)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("RISKGATE_REGISTRY_URL", "http://localhost:5001")?,
            api_token: std::env::var("RISKGATE_REGISTRY_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
            timeout_secs: std::env::var("RISKGATE_REGISTRY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            max_retries: env_parse("RISKGATE_REGISTRY_RETRIES", DEFAULT_MAX_RETRIES)
                .min(MAX_RETRIES_CAP),
            retry_base_delay_ms: env_parse(
                "RISKGATE_REGISTRY_RETRY_DELAY_MS",
                DEFAULT_RETRY_BASE_DELAY_MS,
            ),
        })
    }

    /// Create a configuration pointing at a local registry (stub or test server).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed.
    pub fn local(port: u16) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&format!("http://127.0.0.1:{port}"))
            .map_err(|e| ConfigError::InvalidUrl("localhost".to_string(), e.to_string()))?;
        Ok(Self {
            base_url,
            api_token: None,
            timeout_secs: 5,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        })
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("registry token contains characters not allowed in a header")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_builds_valid_config() {
        let cfg = RegistryConfig::local(5001).unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:5001/");
        assert_eq!(cfg.timeout_secs, 5);
        assert!(cfg.api_token.is_none());
        assert_eq!(cfg.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(cfg.retry_base_delay(), Duration::from_millis(200));
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("RISKGATE_TEST_REGISTRY_RETRIES", "many");
        let parsed: u32 = env_parse("RISKGATE_TEST_REGISTRY_RETRIES", DEFAULT_MAX_RETRIES);
        std::env::remove_var("RISKGATE_TEST_REGISTRY_RETRIES");
        assert_eq!(parsed, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn debug_redacts_token() {
        let mut cfg = RegistryConfig::local(5001).unwrap();
        cfg.api_token = Some(Zeroizing::new("super-secret".into()));
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("RISKGATE_NONEXISTENT_VAR_12345", "http://localhost:5001").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/");
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("RISKGATE_TEST_BAD_URL_REG", "not a url");
        let result = env_url("RISKGATE_TEST_BAD_URL_REG", "http://localhost:5001");
        std::env::remove_var("RISKGATE_TEST_BAD_URL_REG");
        assert!(result.is_err());
    }
}

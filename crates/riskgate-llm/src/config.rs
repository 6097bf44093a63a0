//! Gemini client configuration.

use url::Url;
use zeroize::Zeroizing;

/// Default generative-language API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Configuration for the Gemini `generateContent` API.
///
/// Custom `Debug` implementation redacts the `api_key` field
/// to prevent credential leakage in log output.
#[derive(Clone)]
pub struct GeminiConfig {
    pub base_url: Url,
    /// API key sent as `x-goog-api-key`. Zeroized on drop.
    pub api_key: Zeroizing<String>,
    pub model: String,
    /// HTTP client timeout in seconds.
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl GeminiConfig {
    /// Configuration with defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| ConfigError::InvalidUrl("base_url".to_string(), e.to_string()))?;
        Ok(Self {
            base_url,
            api_key: Zeroizing::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 60,
            max_output_tokens: 2048,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `GEMINI_API_KEY` (required)
    /// - `RISKGATE_LLM_BASE_URL` (default: `https://generativelanguage.googleapis.com`)
    /// - `RISKGATE_LLM_MODEL` (default: `gemini-2.0-flash`)
    /// - `RISKGATE_LLM_TIMEOUT_SECS` (default: 60)
    /// - `RISKGATE_LLM_MAX_OUTPUT_TOKENS` (default: 2048)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let mut config = Self::new(api_key)?;

        if let Ok(raw) = std::env::var("RISKGATE_LLM_BASE_URL") {
            config.base_url = Url::parse(&raw)
                .map_err(|e| ConfigError::InvalidUrl("RISKGATE_LLM_BASE_URL".into(), e.to_string()))?;
        }
        if let Ok(model) = std::env::var("RISKGATE_LLM_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        if let Some(secs) = env_parse("RISKGATE_LLM_TIMEOUT_SECS") {
            config.timeout_secs = secs;
        }
        if let Some(tokens) = env_parse("RISKGATE_LLM_MAX_OUTPUT_TOKENS") {
            config.max_output_tokens = tokens;
        }
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("API key contains characters not allowed in a header")]
    InvalidApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let cfg = GeminiConfig::new("k").unwrap();
        assert_eq!(cfg.model, "gemini-2.0-flash");
        assert_eq!(cfg.max_output_tokens, 2048);
        assert_eq!(cfg.timeout_secs, 60);
        assert_eq!(cfg.base_url.as_str(), "https://generativelanguage.googleapis.com/");
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = GeminiConfig::new("AIza-very-secret").unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("AIza-very-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn env_parse_ignores_garbage() {
        std::env::set_var("RISKGATE_TEST_LLM_PARSE", "sixty");
        let parsed: Option<u64> = env_parse("RISKGATE_TEST_LLM_PARSE");
        std::env::remove_var("RISKGATE_TEST_LLM_PARSE");
        assert!(parsed.is_none());
    }
}

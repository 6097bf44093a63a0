//! # Pipeline Configuration
//!
//! [`PipelineConfig`] is immutable once an orchestrator is built. It can be
//! constructed from defaults, loaded from YAML, and overridden from
//! `RISKGATE_*` environment variables. Every loader ends with
//! [`PipelineConfig::validate`].
//!
//! ```yaml
//! max_keywords: 5
//! max_candidates: 30
//! default_top_n: 3
//! malformed_policy: degrade
//! fallback_keywords: [data, model, security, privacy, governance]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use riskgate_core::{Keyword, DEFAULT_MAX_PROPOSAL_CHARS};

/// Upper bound on `model_retries`.
pub const MAX_MODEL_RETRIES: u32 = 5;

/// Upper bound on `retry_base_delay_ms`.
pub const MAX_RETRY_BASE_DELAY_MS: u64 = 10_000;

/// What to do when model output stays malformed after the re-prompt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Terminate with `ModelOutputMalformed`.
    Fail,
    /// Continue with a fallback and mark the result degraded.
    Degrade,
}

impl MalformedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Degrade => "degrade",
        }
    }
}

impl std::str::FromStr for MalformedPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "degrade" => Ok(Self::Degrade),
            other => Err(ConfigError::Invalid {
                field: "malformed_policy",
                reason: format!("expected fail or degrade, got {other:?}"),
            }),
        }
    }
}

/// Tunables for one [`PipelineOrchestrator`](crate::PipelineOrchestrator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_proposal_chars: usize,
    pub max_keywords: usize,
    pub max_candidates: usize,
    pub default_top_n: usize,
    pub max_top_n: usize,
    /// Retries after the first attempt for transient model errors.
    pub model_retries: u32,
    pub retry_base_delay_ms: u64,
    pub model_call_timeout_ms: u64,
    pub assessment_timeout_ms: u64,
    /// Clarifying re-prompts after a malformed response (0 or 1).
    pub malformed_reprompts: u32,
    pub malformed_policy: MalformedPolicy,
    /// Rejected/total ratio above which a ranking is degraded.
    pub max_rejected_fraction: f64,
    /// Keep risks with an empty control list when the registry fails
    /// during enrichment.
    pub degrade_enrichment: bool,
    pub fallback_keywords: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_proposal_chars: DEFAULT_MAX_PROPOSAL_CHARS,
            max_keywords: 5,
            max_candidates: 30,
            default_top_n: 3,
            max_top_n: 10,
            model_retries: 2,
            retry_base_delay_ms: 200,
            model_call_timeout_ms: 60_000,
            assessment_timeout_ms: 120_000,
            malformed_reprompts: 1,
            malformed_policy: MalformedPolicy::Degrade,
            max_rejected_fraction: 0.5,
            degrade_enrichment: true,
            fallback_keywords: ["data", "model", "security", "privacy", "governance"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML file. Missing fields take their defaults.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RISKGATE_*` overrides on top of the current values.
    ///
    /// Variables: `RISKGATE_MAX_PROPOSAL_CHARS`, `RISKGATE_MAX_KEYWORDS`,
    /// `RISKGATE_MAX_CANDIDATES`, `RISKGATE_DEFAULT_TOP_N`,
    /// `RISKGATE_MAX_TOP_N`, `RISKGATE_MODEL_RETRIES`,
    /// `RISKGATE_RETRY_BASE_DELAY_MS`, `RISKGATE_MODEL_CALL_TIMEOUT_MS`,
    /// `RISKGATE_ASSESSMENT_TIMEOUT_MS`, `RISKGATE_MALFORMED_REPROMPTS`,
    /// `RISKGATE_MALFORMED_POLICY`, `RISKGATE_MAX_REJECTED_FRACTION`,
    /// `RISKGATE_DEGRADE_ENRICHMENT`, `RISKGATE_FALLBACK_KEYWORDS`
    /// (comma-separated).
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        override_from_env("RISKGATE_MAX_PROPOSAL_CHARS", "max_proposal_chars", &mut self.max_proposal_chars)?;
        override_from_env("RISKGATE_MAX_KEYWORDS", "max_keywords", &mut self.max_keywords)?;
        override_from_env("RISKGATE_MAX_CANDIDATES", "max_candidates", &mut self.max_candidates)?;
        override_from_env("RISKGATE_DEFAULT_TOP_N", "default_top_n", &mut self.default_top_n)?;
        override_from_env("RISKGATE_MAX_TOP_N", "max_top_n", &mut self.max_top_n)?;
        override_from_env("RISKGATE_MODEL_RETRIES", "model_retries", &mut self.model_retries)?;
        override_from_env("RISKGATE_RETRY_BASE_DELAY_MS", "retry_base_delay_ms", &mut self.retry_base_delay_ms)?;
        override_from_env("RISKGATE_MODEL_CALL_TIMEOUT_MS", "model_call_timeout_ms", &mut self.model_call_timeout_ms)?;
        override_from_env("RISKGATE_ASSESSMENT_TIMEOUT_MS", "assessment_timeout_ms", &mut self.assessment_timeout_ms)?;
        override_from_env("RISKGATE_MALFORMED_REPROMPTS", "malformed_reprompts", &mut self.malformed_reprompts)?;
        override_from_env("RISKGATE_MALFORMED_POLICY", "malformed_policy", &mut self.malformed_policy)?;
        override_from_env("RISKGATE_MAX_REJECTED_FRACTION", "max_rejected_fraction", &mut self.max_rejected_fraction)?;
        override_from_env("RISKGATE_DEGRADE_ENRICHMENT", "degrade_enrichment", &mut self.degrade_enrichment)?;
        if let Ok(raw) = std::env::var("RISKGATE_FALLBACK_KEYWORDS") {
            self.fallback_keywords = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    /// Check ranges and that every fallback keyword survives sanitization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.max_proposal_chars == 0 {
            return Err(invalid("max_proposal_chars", "must be at least 1"));
        }
        if self.max_keywords == 0 {
            return Err(invalid("max_keywords", "must be at least 1"));
        }
        if self.max_candidates == 0 {
            return Err(invalid("max_candidates", "must be at least 1"));
        }
        if self.max_top_n == 0 {
            return Err(invalid("max_top_n", "must be at least 1"));
        }
        if self.default_top_n == 0 || self.default_top_n > self.max_top_n {
            return Err(invalid(
                "default_top_n",
                format!("must be in 1..={}", self.max_top_n),
            ));
        }
        if self.model_retries > MAX_MODEL_RETRIES {
            return Err(invalid(
                "model_retries",
                format!("must be at most {MAX_MODEL_RETRIES}"),
            ));
        }
        if self.retry_base_delay_ms > MAX_RETRY_BASE_DELAY_MS {
            return Err(invalid(
                "retry_base_delay_ms",
                format!("must be at most {MAX_RETRY_BASE_DELAY_MS}"),
            ));
        }
        if self.malformed_reprompts > 1 {
            return Err(invalid("malformed_reprompts", "must be 0 or 1"));
        }
        if !(0.0..=1.0).contains(&self.max_rejected_fraction) {
            return Err(invalid("max_rejected_fraction", "must be in 0.0..=1.0"));
        }
        if self.model_call_timeout_ms == 0 || self.assessment_timeout_ms == 0 {
            return Err(invalid("timeouts", "must be non-zero"));
        }
        for raw in &self.fallback_keywords {
            Keyword::new(raw.as_str())
                .map_err(|e| invalid("fallback_keywords", e.to_string()))?;
        }
        Ok(())
    }

    /// Fallback keywords as sanitized [`Keyword`]s, deduplicated.
    pub fn fallback_keywords(&self) -> Vec<Keyword> {
        let mut out: Vec<Keyword> = Vec::new();
        for raw in &self.fallback_keywords {
            if let Ok(kw) = Keyword::new(raw.as_str()) {
                if !out.contains(&kw) {
                    out.push(kw);
                }
            }
        }
        out
    }

    pub fn model_call_timeout(&self) -> Duration {
        Duration::from_millis(self.model_call_timeout_ms)
    }

    pub fn assessment_timeout(&self) -> Duration {
        Duration::from_millis(self.assessment_timeout_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

fn override_from_env<T>(var: &str, field: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(var) {
        *slot = raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            field,
            reason: format!("{var}: {e}"),
        })?;
    }
    Ok(())
}

/// Errors loading or validating [`PipelineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

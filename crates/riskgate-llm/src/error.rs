//! LLM client error types.
//!
//! The variants are the categories the pipeline reacts to: `Unavailable`
//! and `Timeout` are transient and retried, `Malformed` triggers a
//! clarifying re-prompt, `Rejected` is a configuration problem and is
//! surfaced as-is.

/// Errors from LLM calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport failure, rate limiting, or a 5xx from the provider.
    #[error("model endpoint unavailable: {reason}")]
    Unavailable { reason: String },
    /// The HTTP client timed out waiting for a response.
    #[error("model call timed out")]
    Timeout,
    /// The provider refused the request (4xx other than 429).
    #[error("model endpoint rejected the request with status {status}")]
    Rejected { status: u16 },
    /// The response did not match the requested JSON shape.
    #[error("model output malformed: {reason}")]
    Malformed { reason: String },
    /// Client configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl LlmError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout)
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Classify a transport error from `reqwest`.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Unavailable {
                reason: err.to_string(),
            }
        }
    }

    /// Classify a non-success HTTP status.
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Self::Unavailable {
                reason: format!("provider returned {}", status.as_u16()),
            }
        } else {
            Self::Rejected {
                status: status.as_u16(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        assert!(LlmError::from_status(StatusCode::TOO_MANY_REQUESTS).is_transient());
        assert!(LlmError::from_status(StatusCode::BAD_GATEWAY).is_transient());
        assert!(LlmError::Timeout.is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = LlmError::from_status(StatusCode::FORBIDDEN);
        assert!(matches!(err, LlmError::Rejected { status: 403 }));
        assert!(!err.is_transient());
        assert!(!LlmError::malformed("missing keywords").is_transient());
    }
}

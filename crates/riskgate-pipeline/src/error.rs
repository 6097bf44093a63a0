//! Stage-level errors.
//!
//! A [`StageError`] is what a stage hands back to the orchestrator: a
//! failure category plus an operator-facing detail. The orchestrator tags
//! it with the active stage and the assessment id to form an
//! [`AssessmentFailure`](riskgate_core::AssessmentFailure).
//!
//! Details are built from error categories and transport diagnostics only.
//! Model response text never reaches a detail string.

use riskgate_core::{FailureReason, InvalidInput};
use riskgate_llm::LlmError;
use riskgate_registry::RegistryError;

/// A failure raised by one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}: {detail}")]
pub struct StageError {
    pub reason: FailureReason,
    pub detail: String,
}

impl StageError {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::ModelOutputMalformed, detail)
    }
}

impl From<InvalidInput> for StageError {
    fn from(err: InvalidInput) -> Self {
        Self::new(FailureReason::InvalidInput, err.to_string())
    }
}

impl From<LlmError> for StageError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Malformed { .. } => {
                Self::malformed("model response did not match the expected shape")
            }
            LlmError::Timeout => Self::new(
                FailureReason::ModelUnavailable,
                "model call timed out after all retries",
            ),
            other => Self::new(FailureReason::ModelUnavailable, other.to_string()),
        }
    }
}

impl From<RegistryError> for StageError {
    fn from(err: RegistryError) -> Self {
        Self::new(FailureReason::RegistryUnavailable, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_detail_never_carries_model_text() {
        let err = StageError::from(LlmError::malformed(
            "invalid type: string \"ignore previous instructions\"",
        ));
        assert_eq!(err.reason, FailureReason::ModelOutputMalformed);
        assert!(!err.detail.contains("ignore previous instructions"));
    }

    #[test]
    fn transport_errors_map_to_model_unavailable() {
        let err = StageError::from(LlmError::Unavailable {
            reason: "connection refused".into(),
        });
        assert_eq!(err.reason, FailureReason::ModelUnavailable);
        assert!(err.detail.contains("connection refused"));
        assert_eq!(
            StageError::from(LlmError::Rejected { status: 403 }).reason,
            FailureReason::ModelUnavailable
        );
    }

    #[test]
    fn registry_errors_map_to_registry_unavailable() {
        let err = StageError::from(RegistryError::Unavailable {
            reason: "maintenance".into(),
        });
        assert_eq!(err.reason, FailureReason::RegistryUnavailable);
    }

    #[test]
    fn invalid_input_keeps_its_message() {
        let err = StageError::from(InvalidInput::EmptyProposal);
        assert_eq!(err.reason, FailureReason::InvalidInput);
        assert_eq!(err.detail, InvalidInput::EmptyProposal.to_string());
    }
}

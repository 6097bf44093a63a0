//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Assessment failures map to HTTP status by [`FailureReason`]; the body
//! carries the failed stage and reason codes. Upstream and internal
//! messages are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use riskgate_core::{AssessmentFailure, FailureReason};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "VALIDATION_ERROR", "TIMEOUT").
    pub code: String,
    pub message: String,
    /// For assessment failures: `assessment_id`, `stage` and `reason`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (422).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request body exceeds the configured limit (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Missing or invalid bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The pipeline returned a tagged failure.
    #[error("{0}")]
    Assessment(AssessmentFailure),

    /// A dependency call outside the pipeline failed (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Assessment(failure) => failure_status(failure.reason),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

/// HTTP status and error code for a failure category.
pub fn failure_status(reason: FailureReason) -> (StatusCode, &'static str) {
    match reason {
        FailureReason::InvalidInput => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT"),
        FailureReason::ModelUnavailable => (StatusCode::BAD_GATEWAY, "MODEL_UNAVAILABLE"),
        FailureReason::ModelOutputMalformed => {
            (StatusCode::BAD_GATEWAY, "MODEL_OUTPUT_MALFORMED")
        }
        FailureReason::RegistryUnavailable => (StatusCode::BAD_GATEWAY, "REGISTRY_UNAVAILABLE"),
        FailureReason::Timeout => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
        FailureReason::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED"),
    }
}

impl From<AssessmentFailure> for AppError {
    fn from(failure: AssessmentFailure) -> Self {
        Self::Assessment(failure)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match &self {
            Self::Assessment(failure) => {
                // The detail of an invalid-input failure describes the
                // caller's own request; everything else stays server-side.
                let message = if failure.reason == FailureReason::InvalidInput {
                    failure.detail.clone()
                } else {
                    format!(
                        "assessment failed at stage {}: {}",
                        failure.stage, failure.reason
                    )
                };
                let details = serde_json::json!({
                    "assessment_id": failure.assessment_id,
                    "stage": failure.stage,
                    "reason": failure.reason,
                });
                (message, Some(details))
            }
            Self::Internal(_) => ("An internal error occurred".to_string(), None),
            Self::Upstream(_) => ("An upstream service error occurred".to_string(), None),
            other => (other.to_string(), None),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::error!(error = %self, "upstream error"),
            Self::Assessment(f) if f.reason != FailureReason::InvalidInput => {
                tracing::warn!(error = %self, "assessment failed")
            }
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

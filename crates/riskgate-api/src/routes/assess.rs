//! # Assessment API
//!
//! Accepts structured proposals, runs them through the assessment pipeline
//! and returns the result contract unchanged. Completed and degraded
//! results are both `200 OK`; the `status` field tells them apart.
//! Failures map to error responses by reason (see [`crate::error`]).

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use riskgate_core::{AssessmentResult, ProposalDocument};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::AppState;

/// Key under which call-for-proposals context is folded into the proposal.
pub const CFP_FIELD: &str = "CFP Context";

/// Request for `POST /api/v1/assess-risks`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssessRequest {
    /// Structured proposal. Only `description` is required.
    #[schema(value_type = Object)]
    pub proposal: ProposalDocument,
    /// Optional call-for-proposals context, rendered into the proposal text.
    #[serde(default)]
    pub cfp: Option<serde_json::Value>,
    /// Number of risks to return (1..=10, default 3).
    #[serde(default)]
    pub top_n: Option<usize>,
}

impl Validate for AssessRequest {
    fn validate(&self) -> Result<(), String> {
        match &self.cfp {
            None | Some(serde_json::Value::Object(_)) => Ok(()),
            Some(_) => Err("cfp must be a JSON object".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TopNParams {
    /// Number of risks to return (1..=10, default 3).
    pub top_n: Option<usize>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/assess-risks", post(assess_risks))
        .route("/api/v1/assess-risks-simple", post(assess_risks_simple))
}

/// POST /api/v1/assess-risks: Assess a proposal with optional CFP context.
#[utoipa::path(
    post,
    path = "/api/v1/assess-risks",
    request_body = AssessRequest,
    responses(
        (status = 200, description = "Assessment completed (possibly degraded)", body = serde_json::Value),
        (status = 422, description = "Invalid proposal or top_n", body = crate::error::ErrorBody),
        (status = 502, description = "Model or registry unavailable, or model output malformed", body = crate::error::ErrorBody),
        (status = 504, description = "Assessment deadline exceeded", body = crate::error::ErrorBody),
    ),
    tag = "assessment"
)]
pub async fn assess_risks(
    State(state): State<AppState>,
    body: Result<Json<AssessRequest>, JsonRejection>,
) -> Result<Json<AssessmentResult>, AppError> {
    let request = extract_validated_json(body)?;
    let mut document = request.proposal;
    if let Some(cfp) = request.cfp {
        document.additional_fields.insert(CFP_FIELD.to_string(), cfp);
    }
    run_assessment(&state, document, request.top_n).await
}

/// POST /api/v1/assess-risks-simple: Assess a bare proposal document.
#[utoipa::path(
    post,
    path = "/api/v1/assess-risks-simple",
    params(TopNParams),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Assessment completed (possibly degraded)", body = serde_json::Value),
        (status = 422, description = "Invalid proposal or top_n", body = crate::error::ErrorBody),
        (status = 502, description = "Model or registry unavailable, or model output malformed", body = crate::error::ErrorBody),
        (status = 504, description = "Assessment deadline exceeded", body = crate::error::ErrorBody),
    ),
    tag = "assessment"
)]
pub async fn assess_risks_simple(
    State(state): State<AppState>,
    params: Result<Query<TopNParams>, QueryRejection>,
    body: Result<Json<ProposalDocument>, JsonRejection>,
) -> Result<Json<AssessmentResult>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let document = extract_json(body)?;
    run_assessment(&state, document, params.top_n).await
}

async fn run_assessment(
    state: &AppState,
    document: ProposalDocument,
    top_n: Option<usize>,
) -> Result<Json<AssessmentResult>, AppError> {
    tracing::info!(
        title = document.proposal_title.as_deref().unwrap_or("Untitled"),
        "assessment requested"
    );
    let outcome = state
        .orchestrator
        .assess(document.into_proposal(), top_n)
        .await;
    if state.config.metrics_enabled {
        state.metrics.record_assessment(&outcome);
    }
    Ok(Json(outcome?))
}

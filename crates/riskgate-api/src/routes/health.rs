//! # Dependency Health
//!
//! `/api/health` probes the model endpoint and the registry concurrently
//! and reports `healthy` only when both answer. `/api/models` lists the
//! models the provider advertises.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use riskgate_llm::ModelInfo;

use crate::error::AppError;
use crate::state::{AppState, SERVICE_NAME};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
    pub dependencies: DependencyHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DependencyHealth {
    pub llm: bool,
    pub registry: bool,
    /// Registry failure description, when unhealthy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    #[schema(value_type = Vec<Object>)]
    pub models: Vec<ModelInfo>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/models", get(list_models))
}

/// GET /api/health: Report dependency health.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Dependency health", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn api_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;
    let (llm, registry) = tokio::join!(
        orchestrator.llm().health_check(),
        orchestrator.registry().health_check()
    );

    let registry_ok = registry.is_healthy();
    let status = if llm && registry_ok {
        "healthy"
    } else {
        tracing::warn!(llm, registry = %registry, "dependency health degraded");
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: orchestrator.llm().model_name().to_string(),
        dependencies: DependencyHealth {
            llm,
            registry: registry_ok,
            registry_detail: (!registry_ok).then(|| registry.to_string()),
        },
    })
}

/// GET /api/models: List models available from the provider.
#[utoipa::path(
    get,
    path = "/api/models",
    responses(
        (status = 200, description = "Available models", body = ModelsResponse),
        (status = 502, description = "Provider unavailable", body = crate::error::ErrorBody),
    ),
    tag = "health"
)]
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>, AppError> {
    let models = state
        .orchestrator
        .llm()
        .list_models()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;
    Ok(Json(ModelsResponse { models }))
}

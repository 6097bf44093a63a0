//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one document, served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Bearer token authentication. Set via RISKGATE_AUTH_TOKEN.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "riskgate API",
        version = "0.3.0",
        description = "Assesses AI/ML project proposals against a curated risk/control taxonomy and returns the most relevant risks with their mitigating controls.\n\nAuthentication: Bearer token via `Authorization: Bearer <token>` when `RISKGATE_AUTH_TOKEN` is set. Only `/api/v1/*` is guarded.",
        license(name = "BUSL-1.1")
    ),
    servers(
        (url = "http://localhost:5005", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        crate::routes::assess::assess_risks,
        crate::routes::assess::assess_risks_simple,
        crate::routes::health::api_health,
        crate::routes::health::list_models,
    ),
    components(
        schemas(
            crate::routes::assess::AssessRequest,
            crate::routes::health::HealthResponse,
            crate::routes::health::DependencyHealth,
            crate::routes::health::ModelsResponse,
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "assessment", description = "Proposal risk assessment"),
        (name = "health", description = "Dependency health and model listing"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

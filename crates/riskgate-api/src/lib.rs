//! # riskgate-api: HTTP Service
//!
//! Thin axum transport over [`riskgate_pipeline::PipelineOrchestrator`].
//! Handlers translate requests into proposals and results into JSON; they
//! hold no assessment logic.
//!
//! ## API Surface
//!
//! | Path | Module | Auth |
//! |------|--------|------|
//! | `POST /api/v1/assess-risks` | [`routes::assess`] | bearer (if configured) |
//! | `POST /api/v1/assess-risks-simple` | [`routes::assess`] | bearer (if configured) |
//! | `GET /api/health` | [`routes::health`] | none |
//! | `GET /api/models` | [`routes::health`] | none |
//! | `GET /health/liveness`, `/health/readiness` | probes | none |
//! | `GET /metrics` | Prometheus | none |
//! | `GET /openapi.json` | [`openapi`] | none |
//! | `GET /` | service info | none |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware (/api/v1 only) → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::{AppState, SERVICE_NAME};

/// Request body limit for assessment endpoints.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Assemble the application router.
///
/// Only the assessment routes sit behind the auth middleware; probes,
/// dependency health, metrics and the OpenAPI document stay open.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig::new(state.config.auth_token.clone());
    let metrics_on = state.config.metrics_enabled;

    let api = routes::assess::router()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(auth::auth_middleware))
        .layer(Extension(auth_config));

    let mut open = Router::new()
        .route("/", get(service_info))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(routes::health::router())
        .merge(openapi::router());
    if metrics_on {
        open = open.route("/metrics", get(prometheus_metrics));
    }

    let mut app = Router::new().merge(open).merge(api);
    if metrics_on {
        app = app
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(state.metrics.clone()));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// GET /: Service info.
async fn service_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/api/health",
            "assess": "/api/v1/assess-risks",
            "assess_simple": "/api/v1/assess-risks-simple",
            "models": "/api/models",
            "metrics": "/metrics",
            "openapi": "/openapi.json",
        }
    }))
}

/// GET /metrics: Prometheus scrape endpoint.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. 200 "ready" when the registry and the model endpoint
/// both answer their health checks, otherwise 503 with a diagnostic.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let orchestrator = &state.orchestrator;
    let (llm, registry) = tokio::join!(
        orchestrator.llm().health_check(),
        orchestrator.registry().health_check()
    );

    if !registry.is_healthy() {
        tracing::warn!(%registry, "readiness: registry unhealthy");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("registry unreachable: {registry}"),
        )
            .into_response();
    }
    if !llm {
        tracing::warn!("readiness: model endpoint unhealthy");
        return (StatusCode::SERVICE_UNAVAILABLE, "model endpoint unreachable").into_response();
    }

    (StatusCode::OK, "ready").into_response()
}

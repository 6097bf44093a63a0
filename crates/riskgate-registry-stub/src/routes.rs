//! Route definitions for the registry stub.
//!
//! Implements the endpoints `HttpRegistryClient` calls, with bodies that
//! deserialize into its wire types, plus `GET /api/risks/:id` for manual
//! inspection.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use riskgate_core::RiskId;
use riskgate_registry::http::SearchResponse;

use crate::store::StubStore;

/// Build the complete router with all registry stub routes.
pub fn router(store: StubStore) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/search", get(search))
        .route("/api/relationships", get(relationships))
        .route("/api/risks/:id", get(risk_get))
        .fallback(not_implemented)
        .with_state(store)
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

// ── Health ──────────────────────────────────────────────────────────

async fn health(State(store): State<StubStore>) -> Response {
    Json(json!({
        "status": "healthy",
        "risks": store.risk_count(),
        "controls": store.control_count(),
    }))
    .into_response()
}

// ── Search ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(State(store): State<StubStore>, Query(params): Query<SearchParams>) -> Response {
    let Some(q) = params.q.filter(|q| !q.trim().is_empty()) else {
        return error(StatusCode::BAD_REQUEST, "query parameter 'q' is required");
    };
    let results = store.search(&q);
    tracing::debug!(q = %q, hits = results.len(), "search");
    Json(SearchResponse { results }).into_response()
}

// ── Relationships ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RelationshipParams {
    risk_ids: Option<String>,
}

async fn relationships(
    State(store): State<StubStore>,
    Query(params): Query<RelationshipParams>,
) -> Response {
    let Some(raw) = params.risk_ids else {
        return error(StatusCode::BAD_REQUEST, "query parameter 'risk_ids' is required");
    };

    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match RiskId::new(part) {
            Ok(id) => ids.push(id),
            Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }

    Json(store.relationships(&ids)).into_response()
}

// ── Risks ───────────────────────────────────────────────────────────

async fn risk_get(State(store): State<StubStore>, Path(id): Path<String>) -> Response {
    let id = match RiskId::new(id) {
        Ok(id) => id,
        Err(e) => return error(StatusCode::BAD_REQUEST, e.to_string()),
    };
    match store.risk(&id) {
        Some(risk) => Json(risk).into_response(),
        None => error(StatusCode::NOT_FOUND, format!("risk {id} not found")),
    }
}

async fn not_implemented() -> Response {
    error(StatusCode::NOT_IMPLEMENTED, "not implemented in registry stub")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_app() -> Router {
        router(StubStore::builtin())
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let (status, body) = get(test_app(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["risks"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn search_returns_risk_rows() {
        let (status, body) = get(test_app(), "/api/search?q=chatbot").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["results"].as_array().unwrap();
        let risk_ids: Vec<_> = rows
            .iter()
            .filter(|r| r["type"] == "risk")
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(risk_ids, vec!["R.AIR.006", "R.AIR.007"]);
    }

    #[tokio::test]
    async fn search_without_query_is_bad_request() {
        let (status, body) = get(test_app(), "/api/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("'q'"));
    }

    #[tokio::test]
    async fn relationships_for_two_risks() {
        let (status, body) = get(
            test_app(),
            "/api/relationships?risk_ids=R.AIR.001,R.AIR.007",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert!(rows.iter().any(|r| r["source_id"] == "R.AIR.001"));
        assert!(rows.iter().any(|r| r["source_id"] == "R.AIR.007"));
        assert!(rows.iter().all(|r| r["relationship_type"] == "risk_control"));
    }

    #[tokio::test]
    async fn relationships_reject_malformed_id() {
        let (status, _) = get(test_app(), "/api/relationships?risk_ids=DROP%20TABLE").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn risk_lookup() {
        let (status, body) = get(test_app(), "/api/risks/R.AIR.006").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "R.AIR.006");

        let (status, _) = get(test_app(), "/api/risks/R.AIR.999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_path_returns_501() {
        let (status, _) = get(test_app(), "/api/frameworks").await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    }
}

//! Contract tests for HttpRegistryClient against the registry REST API.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | GET | `/api/search` | `search_*` |
//! | GET | `/api/relationships` | `controls_*` |
//! | GET | `/api/health` | `health_*` |

use riskgate_core::{Keyword, RiskId};
use riskgate_registry::{HttpRegistryClient, RegistryConfig, RegistryError, RiskRegistry};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

fn test_client(mock_server: &MockServer) -> HttpRegistryClient {
    let config = RegistryConfig {
        base_url: mock_server.uri().parse().unwrap(),
        api_token: None,
        timeout_secs: 5,
        max_retries: 2,
        retry_base_delay_ms: 1,
    };
    HttpRegistryClient::new(config).unwrap()
}

fn kw(s: &str) -> Keyword {
    Keyword::new(s).unwrap()
}

fn rid(s: &str) -> RiskId {
    RiskId::new(s).unwrap()
}

// ── GET /api/search ──────────────────────────────────────────────────

#[tokio::test]
async fn search_returns_risk_rows_in_response_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("q", "data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"type": "risk", "id": "R.AIR.002", "title": "Data poisoning (backdoor)", "description": "b"},
                {"type": "control", "id": "C.AIIM.1", "title": "Maintain ML-Asset Inventory"},
                {"type": "risk", "id": "R.AIR.001", "title": "Data poisoning (targeted)", "description": "a",
                 "keywords": ["data", "poisoning"]}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let risks = client.find_risks_by_keyword(&kw("data")).await.unwrap();

    let ids: Vec<_> = risks.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["R.AIR.002", "R.AIR.001"]);
    assert_eq!(risks[1].keywords, vec!["data", "poisoning"]);
}

#[tokio::test]
async fn search_skips_malformed_and_duplicate_ids() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"type": "risk", "id": "not-an-id", "title": "bad"},
                {"type": "risk", "id": "R.AIR.001", "title": "first"},
                {"type": "risk", "id": "R.AIR.001", "title": "again"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let risks = client.find_risks_by_keyword(&kw("poisoning")).await.unwrap();

    assert_eq!(risks.len(), 1);
    assert_eq!(risks[0].title, "first");
}

#[tokio::test]
async fn search_with_no_results_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    assert!(client
        .find_risks_by_keyword(&kw("quantum"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn search_handles_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.find_risks_by_keyword(&kw("data")).await.unwrap_err();
    match err {
        RegistryError::ApiError { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "database offline");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn search_handles_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.find_risks_by_keyword(&kw("data")).await.unwrap_err();
    assert!(matches!(err, RegistryError::Deserialization { .. }));
}

#[tokio::test]
async fn search_sends_bearer_token_when_configured() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(header("authorization", "Bearer registry-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = RegistryConfig {
        base_url: mock_server.uri().parse().unwrap(),
        api_token: Some(Zeroizing::new("registry-secret".into())),
        timeout_secs: 5,
        max_retries: 2,
        retry_base_delay_ms: 1,
    };
    let client = HttpRegistryClient::new(config).unwrap();
    client.find_risks_by_keyword(&kw("data")).await.unwrap();
}

// ── GET /api/relationships ───────────────────────────────────────────

#[tokio::test]
async fn controls_filters_to_risk_control_rows_for_the_risk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/relationships"))
        .and(query_param("risk_ids", "R.AIR.001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"source_id": "R.AIR.001", "target_id": "C.AIIM.1", "relationship_type": "risk_control",
             "target_title": "Maintain ML-Asset Inventory"},
            {"source_id": "R.AIR.001", "target_id": "C.AIIM.3", "relationship_type": "risk_control"},
            {"source_id": "R.AIR.001", "target_id": "R.AIR.002", "relationship_type": "related_risk"},
            {"source_id": "R.AIR.009", "target_id": "C.SEC.2", "relationship_type": "risk_control"},
            {"source_id": "R.AIR.001", "target_id": "C.AIIM.1", "relationship_type": "risk_control"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let controls = client.get_controls(&rid("R.AIR.001")).await.unwrap();

    let ids: Vec<_> = controls.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["C.AIIM.1", "C.AIIM.3"]);
    assert_eq!(controls[0].title, "Maintain ML-Asset Inventory");
    assert_eq!(controls[1].title, "Control C.AIIM.3");
    assert_eq!(controls[1].risk_ids, vec![rid("R.AIR.001")]);
}

#[tokio::test]
async fn controls_empty_list_is_valid() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/relationships"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    assert!(client
        .get_controls(&rid("R.AIR.014"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn controls_handles_service_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/relationships"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.get_controls(&rid("R.AIR.001")).await.unwrap_err();
    assert!(matches!(err, RegistryError::ApiError { status: 503, .. }));
}

#[tokio::test]
async fn controls_recover_after_transient_overload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/relationships"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/relationships"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "source_id": "R.AIR.001",
                "target_id": "C.AIIM.1",
                "relationship_type": "risk_control",
                "target_title": "Training data provenance"
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let controls = client.get_controls(&rid("R.AIR.001")).await.unwrap();
    assert_eq!(controls.len(), 1);
    assert_eq!(controls[0].id.as_str(), "C.AIIM.1");
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.find_risks_by_keyword(&kw("data")).await.unwrap_err();
    assert!(matches!(err, RegistryError::ApiError { status: 404, .. }));
}

// ── GET /api/health ──────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_healthy_on_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    assert!(client.health_check().await.is_healthy());
}

#[tokio::test]
async fn health_reports_status_code_on_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let health = client.health_check().await;
    assert!(!health.is_healthy());
    assert!(health.to_string().contains("500"));
}

#[tokio::test]
async fn health_reports_unreachable_server() {
    let config = RegistryConfig {
        base_url: "http://127.0.0.1:1".parse().unwrap(),
        api_token: None,
        timeout_secs: 1,
        max_retries: 0,
        retry_base_delay_ms: 1,
    };
    let client = HttpRegistryClient::new(config).unwrap();
    assert!(!client.health_check().await.is_healthy());
    assert_eq!(client.name(), "HttpRegistryClient");
}

//! Typed client for the registry REST API.
//!
//! ## API Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/api/search?q={keyword}` | Search risks (and other row types) |
//! | GET | `/api/relationships?risk_ids={id}` | Risk → control relationships |
//! | GET | `/api/health` | Liveness |
//!
//! Search results carry mixed row types; only `"type": "risk"` rows with a
//! well-formed identifier are returned. Relationship rows other than
//! `risk_control` are ignored.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use riskgate_core::{Control, ControlId, Keyword, RiskId, RiskRecord};

use crate::config::{ConfigError, RegistryConfig};
use crate::error::RegistryError;
use crate::retry::{send_with_retry, RetryPolicy};
use crate::{RegistryHealth, RiskRegistry};

/// Relationship type linking a risk to a control.
pub const RISK_CONTROL: &str = "risk_control";

// -- Wire types ---------------------------------------------------------------

/// `GET /api/search` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// One search row. Fields use `#[serde(default)]` so rows of other types
/// with different shapes still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One row of `GET /api/relationships`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    #[serde(default)]
    pub target_title: Option<String>,
    #[serde(default)]
    pub target_description: Option<String>,
}

// -- Client -------------------------------------------------------------------

/// HTTP client for the registry.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpRegistryClient {
    /// Create a new registry client from configuration.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            headers.insert(
                reqwest::header::AUTHORIZATION,
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                    .map_err(|_| RegistryError::Config(ConfigError::InvalidToken))?,
            );
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| RegistryError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_base_delay(),
            },
        })
    }

    /// GET `path` with retries and decode a 2xx JSON body. Any other final
    /// status becomes [`RegistryError::ApiError`].
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RegistryError> {
        let url = format!("{}{path}", self.base_url);
        let resp = send_with_retry(self.retry, endpoint, || {
            self.http.get(&url).query(query).send()
        })
        .await
        .map_err(|e| RegistryError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(RegistryError::ApiError {
                endpoint: endpoint.into(),
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| RegistryError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })
    }

    /// Raw search call.
    ///
    /// Calls `GET {base_url}/api/search?q={query}`.
    pub async fn search(&self, query: &str) -> Result<SearchResponse, RegistryError> {
        self.get_json("GET /api/search", "/api/search", &[("q", query)]).await
    }

    /// Raw relationships call for a batch of risks.
    ///
    /// Calls `GET {base_url}/api/relationships?risk_ids={a,b,...}`.
    pub async fn relationships(
        &self,
        risk_ids: &[RiskId],
    ) -> Result<Vec<Relationship>, RegistryError> {
        let joined = risk_ids
            .iter()
            .map(RiskId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.get_json(
            "GET /api/relationships",
            "/api/relationships",
            &[("risk_ids", joined.as_str())],
        )
        .await
    }
}

#[async_trait]
impl RiskRegistry for HttpRegistryClient {
    async fn find_risks_by_keyword(
        &self,
        keyword: &Keyword,
    ) -> Result<Vec<RiskRecord>, RegistryError> {
        let response = self.search(keyword.as_str()).await?;
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for hit in response.results {
            if hit.kind != "risk" {
                continue;
            }
            let id = match RiskId::new(hit.id) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(keyword = %keyword, "skipping registry row: {e}");
                    continue;
                }
            };
            if !seen.insert(id.clone()) {
                continue;
            }
            records.push(RiskRecord {
                id,
                title: hit.title,
                description: hit.description,
                keywords: hit.keywords,
            });
        }

        tracing::debug!(keyword = %keyword, matches = records.len(), "registry search");
        Ok(records)
    }

    async fn get_controls(&self, risk_id: &RiskId) -> Result<Vec<Control>, RegistryError> {
        let rows = self.relationships(std::slice::from_ref(risk_id)).await?;
        let mut seen = HashSet::new();
        let mut controls = Vec::new();

        for row in rows {
            if row.relationship_type != RISK_CONTROL || row.source_id != risk_id.as_str() {
                continue;
            }
            let id = match ControlId::new(row.target_id) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(risk_id = %risk_id, "skipping relationship row: {e}");
                    continue;
                }
            };
            if !seen.insert(id.clone()) {
                continue;
            }
            let title = row
                .target_title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("Control {id}"));
            controls.push(Control {
                id,
                title,
                description: row.target_description,
                risk_ids: vec![risk_id.clone()],
            });
        }

        Ok(controls)
    }

    async fn health_check(&self) -> RegistryHealth {
        let url = format!("{}/api/health", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => RegistryHealth::Healthy,
            Ok(resp) => RegistryHealth::Unavailable {
                reason: format!("health endpoint returned {}", resp.status().as_u16()),
            },
            Err(e) => RegistryHealth::Unavailable {
                reason: e.to_string(),
            },
        }
    }

    fn name(&self) -> &str {
        "HttpRegistryClient"
    }
}

//! Gemini `generateContent` client.
//!
//! ## API Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/v1beta/models/{model}:generateContent` | Keyword extraction, ranking |
//! | GET | `/v1beta/models/{model}` | Health check |
//! | GET | `/v1beta/models` | List models |
//!
//! Every generation request asks for JSON output constrained by a response
//! schema, at temperature 0. The text parts of the first candidate are
//! concatenated and parsed into the expected payload; anything that does not
//! parse is [`LlmError::Malformed`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ConfigError, GeminiConfig};
use crate::error::LlmError;
use crate::prompts;
use crate::{KeywordPayload, KeywordRequest, LlmClient, ModelInfo, RankingPayload, RankingRequest};

// -- Wire types ---------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

// -- Client -------------------------------------------------------------------

/// HTTP client for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// Create a new client from configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut key = reqwest::header::HeaderValue::from_str(config.api_key.as_str())
            .map_err(|_| LlmError::Config(ConfigError::InvalidApiKey))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(LlmError::from_transport)?;

        Ok(Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            model: config.model,
            max_output_tokens: config.max_output_tokens,
        })
    }

    /// Run one `generateContent` call and return the concatenated text parts.
    async fn generate(&self, prompt: &str, schema: Value) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), model = %self.model, "generateContent failed");
            return Err(LlmError::from_status(status));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::malformed(format!("response envelope: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::malformed("response has no candidates"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .unwrap_or_else(|| "UNKNOWN".to_string());
            return Err(LlmError::malformed(format!(
                "empty response (finish reason {reason})"
            )));
        }
        Ok(text)
    }
}

/// Parse model text as `T`, tolerating a surrounding markdown code fence.
pub(crate) fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let trimmed = strip_code_fence(text.trim());
    serde_json::from_str(trimmed).map_err(|e| LlmError::malformed(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn extract_keywords(&self, request: &KeywordRequest) -> Result<KeywordPayload, LlmError> {
        let prompt = prompts::keyword_prompt(request);
        let text = self.generate(&prompt, prompts::keyword_schema()).await?;
        let payload: KeywordPayload = parse_payload(&text)?;
        tracing::debug!(keywords = payload.keywords.len(), confidence = ?payload.confidence, "keyword payload");
        Ok(payload)
    }

    async fn rank_risks(&self, request: &RankingRequest) -> Result<RankingPayload, LlmError> {
        let prompt = prompts::ranking_prompt(request);
        let text = self.generate(&prompt, prompts::ranking_schema()).await?;
        let payload: RankingPayload = parse_payload(&text)?;
        tracing::debug!(entries = payload.risks.len(), "ranking payload");
        Ok(payload)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/v1beta/models/{}", self.base_url, self.model);
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::warn!("model health check failed: {e}");
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(LlmError::from_transport)?;
        if !resp.status().is_success() {
            return Err(LlmError::from_status(resp.status()));
        }
        let list: ModelList = resp
            .json()
            .await
            .map_err(|e| LlmError::malformed(format!("model list: {e}")))?;
        Ok(list.models)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

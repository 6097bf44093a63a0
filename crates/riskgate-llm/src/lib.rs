//! # riskgate-llm: LLM Inference Boundary
//!
//! The assessment pipeline talks to a language model in exactly two ways:
//! extracting search keywords from proposal text, and ranking a bounded
//! list of candidate risks. This crate defines that contract
//! ([`LlmClient`]), the prompt templates and response schemas
//! ([`prompts`]), and the Gemini implementation ([`GeminiClient`]).
//!
//! Payloads returned here are shape-checked only. Their contents are
//! untrusted: keyword sanitization and ranking validation happen in the
//! pipeline, never in this crate.

pub mod config;
pub mod error;
pub mod gemini;
pub mod prompts;

pub use config::GeminiConfig;
pub use error::LlmError;
pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use riskgate_core::RiskId;

// ── Requests ─────────────────────────────────────────────────────────

/// Input to keyword extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRequest {
    /// Normalized proposal text.
    pub text: String,
    pub max_keywords: usize,
    /// Set on the clarifying re-prompt after a malformed response.
    pub reprompt: bool,
}

/// A candidate risk as presented to the model: identifier and title only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingCandidate {
    pub risk_id: RiskId,
    pub title: String,
}

/// Input to risk ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRequest {
    pub text: String,
    pub candidates: Vec<RankingCandidate>,
    pub top_n: usize,
    pub reprompt: bool,
}

// ── Payloads ─────────────────────────────────────────────────────────

/// Keyword extraction response: `{"keywords": [...], "confidence": x}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordPayload {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// One entry of a ranking response. Every field is untrusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRankedRisk {
    pub risk_id: String,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default, alias = "reasoning")]
    pub rationale: Option<String>,
}

/// Ranking response: `{"risks": [{"risk_id", "rank", "rationale"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingPayload {
    pub risks: Vec<RawRankedRisk>,
}

/// A model advertised by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ── Trait ────────────────────────────────────────────────────────────

/// Language-model operations used by the assessment pipeline.
///
/// Implementations perform a single attempt per call. Retry, timeout and
/// re-prompt policy belong to the caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn extract_keywords(&self, request: &KeywordRequest) -> Result<KeywordPayload, LlmError>;

    async fn rank_risks(&self, request: &RankingRequest) -> Result<RankingPayload, LlmError>;

    async fn health_check(&self) -> bool;

    /// Models available from the provider. Defaults to none.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        Ok(Vec::new())
    }

    /// Identifier of the model this client calls.
    fn model_name(&self) -> &str;
}

//! # Assessment Result Contract
//!
//! The single artifact handed back to callers: either an
//! [`AssessmentResult`] (completed, possibly degraded) or an
//! [`AssessmentFailure`] tagged with the [`Stage`] that failed and a
//! [`FailureReason`] category.
//!
//! A failure never carries model-authored text. Its `detail` is built from
//! this crate's own error descriptions only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::identity::{Keyword, RiskId};
use crate::risk::Control;

// ── Stage ────────────────────────────────────────────────────────────

/// Pipeline stage, used to tag failures and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    ExtractKeywords,
    GatherCandidates,
    Rank,
    Validate,
    Enrich,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Self::Normalize,
        Self::ExtractKeywords,
        Self::GatherCandidates,
        Self::Rank,
        Self::Validate,
        Self::Enrich,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::ExtractKeywords => "extract_keywords",
            Self::GatherCandidates => "gather_candidates",
            Self::Rank => "rank",
            Self::Validate => "validate",
            Self::Enrich => "enrich",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Failure ──────────────────────────────────────────────────────────

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Caller error. Not retried.
    InvalidInput,
    /// Model endpoint unreachable, rejecting, or timing out after retries.
    ModelUnavailable,
    /// Model response did not match the expected shape after at most one
    /// clarifying re-prompt.
    ModelOutputMalformed,
    /// Registry unreachable or erroring.
    RegistryUnavailable,
    /// The overall assessment deadline elapsed.
    Timeout,
    /// The caller cancelled the assessment.
    Cancelled,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::ModelUnavailable => "model_unavailable",
            Self::ModelOutputMalformed => "model_output_malformed",
            Self::RegistryUnavailable => "registry_unavailable",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of one assessment.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("assessment {assessment_id} failed at stage {stage}: {reason} ({detail})")]
pub struct AssessmentFailure {
    pub assessment_id: Uuid,
    pub stage: Stage,
    pub reason: FailureReason,
    /// Operator-facing description. Never contains model output.
    pub detail: String,
}

// ── Result ───────────────────────────────────────────────────────────

/// Whether the result can be taken at face value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentStatus {
    Completed,
    /// Completed with lowered confidence; `reason` is a diagnostic.
    Degraded { reason: String },
}

/// Explicit annotations on a result that is not a plain top-N answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Caveat {
    /// Fewer risks than requested survived ranking and validation.
    FewerThanRequested { requested: usize, returned: usize },
    /// Validation dropped some ranked entries.
    ValidationRejections { rejected: usize, total: usize },
    /// Controls could not be fetched for these risks.
    PartiallyEnriched { risk_ids: Vec<RiskId> },
    /// Configured fallback keywords were used for retrieval.
    FallbackKeywords { keywords: Vec<Keyword> },
    /// No candidate risks matched; ranking was skipped.
    NoCandidates,
}

/// Whether controls were attached to a risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Controls fetched; the list may legitimately be empty.
    Enriched,
    /// The registry failed; the empty list says nothing about coverage.
    Unavailable,
}

/// One ranked risk with its controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessedRisk {
    pub rank: u32,
    pub risk_id: RiskId,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub controls: Vec<Control>,
    pub enrichment: EnrichmentStatus,
}

/// Completed assessment. `risks` holds 0..=`requested_top_n` entries in
/// rank order, with no repeated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub assessment_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub status: AssessmentStatus,
    pub requested_top_n: usize,
    pub keywords: Vec<Keyword>,
    pub risks: Vec<AssessedRisk>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caveats: Vec<Caveat>,
}

impl AssessmentResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, AssessmentStatus::Degraded { .. })
    }

    pub fn is_partially_enriched(&self) -> bool {
        self.caveats
            .iter()
            .any(|c| matches!(c, Caveat::PartiallyEnriched { .. }))
    }

    pub fn risk_ids(&self) -> impl Iterator<Item = &RiskId> {
        self.risks.iter().map(|r| &r.risk_id)
    }
}

/// Outcome of one assessment.
pub type AssessmentOutcome = Result<AssessmentResult, AssessmentFailure>;

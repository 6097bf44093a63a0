//! # Assessment State Machine
//!
//! One assessment moves through seven forward states to `Completed`, or to
//! a terminal `Failed` from any non-terminal state:
//!
//! ```text
//! Received → Normalized → KeywordsExtracted → CandidatesGathered
//!          → Ranked → Validated → Enriched → Completed
//!
//! (any non-terminal) → Failed { stage, reason }
//! ```
//!
//! Transitions are validated: no skipping, no backtracking, and nothing
//! after a terminal state. Every accepted transition is timestamped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use riskgate_core::{FailureReason, Stage};

// ── Assessment State ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssessmentState {
    Received,
    Normalized,
    KeywordsExtracted,
    CandidatesGathered,
    Ranked,
    Validated,
    Enriched,
    /// Terminal.
    Completed,
    /// Terminal.
    Failed { stage: Stage, reason: FailureReason },
}

impl AssessmentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Normalized => "NORMALIZED",
            Self::KeywordsExtracted => "KEYWORDS_EXTRACTED",
            Self::CandidatesGathered => "CANDIDATES_GATHERED",
            Self::Ranked => "RANKED",
            Self::Validated => "VALIDATED",
            Self::Enriched => "ENRICHED",
            Self::Completed => "COMPLETED",
            Self::Failed { .. } => "FAILED",
        }
    }

    /// The stage that runs to leave this state. `Enriched` only assembles
    /// the result, which is attributed to the enrichment stage.
    pub fn active_stage(&self) -> Option<Stage> {
        match self {
            Self::Received => Some(Stage::Normalize),
            Self::Normalized => Some(Stage::ExtractKeywords),
            Self::KeywordsExtracted => Some(Stage::GatherCandidates),
            Self::CandidatesGathered => Some(Stage::Rank),
            Self::Ranked => Some(Stage::Validate),
            Self::Validated | Self::Enriched => Some(Stage::Enrich),
            Self::Completed | Self::Failed { .. } => None,
        }
    }

    /// Next forward state. Terminal states return `None`; no wildcard so
    /// a new variant must be placed explicitly.
    fn next_forward(&self) -> Option<AssessmentState> {
        match self {
            Self::Received => Some(Self::Normalized),
            Self::Normalized => Some(Self::KeywordsExtracted),
            Self::KeywordsExtracted => Some(Self::CandidatesGathered),
            Self::CandidatesGathered => Some(Self::Ranked),
            Self::Ranked => Some(Self::Validated),
            Self::Validated => Some(Self::Enriched),
            Self::Enriched => Some(Self::Completed),
            Self::Completed | Self::Failed { .. } => None,
        }
    }
}

impl std::fmt::Display for AssessmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed { stage, reason } => write!(f, "FAILED({stage}, {reason})"),
            other => f.write_str(other.as_str()),
        }
    }
}

// ── Error Types ──────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid assessment transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: AssessmentState,
        to: AssessmentState,
        reason: String,
    },
    #[error("assessment {id} is in terminal state {state}")]
    AlreadyTerminal { id: Uuid, state: AssessmentState },
}

// ── Machine ──────────────────────────────────────────────────────────

/// A recorded state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: AssessmentState,
    pub to: AssessmentState,
    pub at: DateTime<Utc>,
}

/// Lifecycle of one assessment.
#[derive(Debug, Clone)]
pub struct AssessmentMachine {
    id: Uuid,
    state: AssessmentState,
    created_at: DateTime<Utc>,
    history: Vec<Transition>,
}

impl AssessmentMachine {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: AssessmentState::Received,
            created_at: Utc::now(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> AssessmentState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Move to `to`, which must be the next forward state or `Failed`.
    pub fn transition(&mut self, to: AssessmentState) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::AlreadyTerminal {
                id: self.id,
                state: self.state,
            });
        }
        let allowed = match to {
            AssessmentState::Failed { .. } => true,
            _ => self.state.next_forward() == Some(to),
        };
        if !allowed {
            return Err(TransitionError::InvalidTransition {
                from: self.state,
                to,
                reason: "only the next forward state or FAILED is reachable".to_string(),
            });
        }

        let from = self.state;
        self.state = to;
        self.history.push(Transition {
            from,
            to,
            at: Utc::now(),
        });
        tracing::debug!(assessment_id = %self.id, from = %from, to = %to, "assessment transition");
        Ok(())
    }

    /// Advance to the next forward state.
    pub fn advance(&mut self) -> Result<AssessmentState, TransitionError> {
        let next = self
            .state
            .next_forward()
            .ok_or(TransitionError::AlreadyTerminal {
                id: self.id,
                state: self.state,
            })?;
        self.transition(next)?;
        Ok(next)
    }

    /// Fail at the currently active stage.
    pub fn fail(&mut self, reason: FailureReason) -> Result<Stage, TransitionError> {
        let stage = self
            .state
            .active_stage()
            .ok_or(TransitionError::AlreadyTerminal {
                id: self.id,
                state: self.state,
            })?;
        self.transition(AssessmentState::Failed { stage, reason })?;
        Ok(stage)
    }
}

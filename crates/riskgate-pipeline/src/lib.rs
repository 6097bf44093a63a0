//! # riskgate-pipeline: Assessment Pipeline
//!
//! Turns a free-text AI/ML proposal into the top-N most relevant risks from
//! the registry taxonomy, each with its mitigating controls.
//!
//! ```text
//! Proposal ─▶ normalize ─▶ extract keywords ─▶ gather candidates
//!          ─▶ rank ─▶ validate ─▶ enrich ─▶ AssessmentResult
//! ```
//!
//! | Module | Stage |
//! |--------|-------|
//! | [`keywords`] | LLM keyword extraction, sanitization, fallback |
//! | [`candidates`] | Registry lookup per keyword, deterministic merge |
//! | [`ranker`] | LLM ranking over identifier + title pairs |
//! | [`validator`] | Pure trust-boundary check of the ranking |
//! | [`enricher`] | Registry control lookup per ranked risk |
//! | [`orchestrator`] | State machine, deadline, cancellation, caveats |
//!
//! Model output is untrusted end to end: keywords are sanitized before any
//! registry query, and ranked identifiers must belong to the candidate set
//! gathered for the same assessment.

pub mod candidates;
pub mod config;
pub mod enricher;
pub mod error;
pub mod keywords;
pub mod orchestrator;
pub mod ranker;
pub(crate) mod retry;
pub mod state;
pub mod validator;

pub use config::{ConfigError, MalformedPolicy, PipelineConfig};
pub use error::StageError;
pub use orchestrator::PipelineOrchestrator;
pub use state::{AssessmentMachine, AssessmentState, TransitionError};
pub use validator::{validate_ranking, RejectionKind, ValidationReport};

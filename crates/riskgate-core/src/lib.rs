//! # riskgate-core: Domain Types
//!
//! Shared vocabulary for the assessment pipeline and its transports.
//!
//! ## Crate Policy
//!
//! - No I/O. Nothing here talks to the model or the registry.
//! - Identifiers ([`RiskId`], [`ControlId`]) and search terms ([`Keyword`])
//!   validate on construction and on deserialization. Model output becomes
//!   one of these types or is rejected.
//! - [`ProposalNormalizer`] is the first pipeline stage and lives here
//!   because it is pure.
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identity`] | `RiskId`, `ControlId`, `Keyword` |
//! | [`proposal`] | `Proposal`, `ProposalDocument`, `ProposalNormalizer` |
//! | [`risk`] | `RiskRecord`, `Control`, `CandidateSet`, `RankedRisk` |
//! | [`assessment`] | `AssessmentResult`, `AssessmentFailure`, `Stage`, `Caveat` |
//! | [`error`] | `ValidationError`, `InvalidInput` |

pub mod assessment;
pub mod error;
pub mod identity;
pub mod proposal;
pub mod risk;

pub use assessment::{
    AssessedRisk, AssessmentFailure, AssessmentOutcome, AssessmentResult, AssessmentStatus,
    Caveat, EnrichmentStatus, FailureReason, Stage,
};
pub use error::{InvalidInput, ValidationError};
pub use identity::{ControlId, Keyword, RiskId, MAX_KEYWORD_CHARS};
pub use proposal::{
    NormalizedProposal, Proposal, ProposalDocument, ProposalMetadata, ProposalNormalizer,
    DEFAULT_MAX_PROPOSAL_CHARS,
};
pub use risk::{CandidateSet, Control, RankedRisk, RiskRecord};

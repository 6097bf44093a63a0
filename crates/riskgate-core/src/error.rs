//! # Error Hierarchy
//!
//! Structured error types for the domain primitives, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.

use thiserror::Error;

/// Domain primitive validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Risk identifier does not match `R.<NAMESPACE>.<NUMBER>`.
    #[error("invalid risk identifier {0:?}: expected R.<NAMESPACE>.<NUMBER>")]
    InvalidRiskId(String),

    /// Control identifier does not match `C.<NAMESPACE>.<NUMBER>`.
    #[error("invalid control identifier {0:?}: expected C.<NAMESPACE>.<NUMBER>")]
    InvalidControlId(String),

    /// Keyword is empty once sanitized.
    #[error("keyword {0:?} is empty after sanitization")]
    EmptyKeyword(String),
}

/// Caller error raised while normalizing a proposal. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInput {
    /// The proposal text is empty after whitespace normalization.
    #[error("proposal text is empty")]
    EmptyProposal,

    /// The proposal text exceeds the configured character cap.
    #[error("proposal text is {len} characters; the maximum is {max}")]
    ProposalTooLong {
        /// Length after normalization, in characters.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The requested number of risks is outside the accepted range.
    #[error("top_n must be between 1 and {max}, got {requested}")]
    TopNOutOfRange {
        /// Value supplied by the caller.
        requested: usize,
        /// Configured maximum.
        max: usize,
    },
}

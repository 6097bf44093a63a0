//! # Identifier and Keyword Newtypes
//!
//! Every value that crosses from model output into a registry query, or
//! from the registry into a result, passes through one of these types.
//! Construction validates; there is no unchecked constructor.
//!
//! ## Formats
//!
//! - Risk: `R.<NAMESPACE>.<NUMBER>`, e.g. `R.AIR.001`
//! - Control: `C.<NAMESPACE>.<NUMBER>`, e.g. `C.AIIM.1`
//!
//! NAMESPACE is 1-16 ASCII uppercase letters, NUMBER is 1-6 ASCII digits.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum namespace length in an identifier.
const MAX_NAMESPACE_LEN: usize = 16;

/// Maximum numeric-suffix length in an identifier.
const MAX_NUMBER_LEN: usize = 6;

/// Maximum length of a sanitized keyword, in characters.
pub const MAX_KEYWORD_CHARS: usize = 64;

/// Deserialize as a plain `String`, then route through `new()` so that
/// invalid values are rejected at deserialization time.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Check `<prefix>.<NAMESPACE>.<NUMBER>`.
fn is_namespaced_id(raw: &str, prefix: &str) -> bool {
    let mut parts = raw.split('.');
    let (Some(head), Some(namespace), Some(number), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    head == prefix
        && (1..=MAX_NAMESPACE_LEN).contains(&namespace.len())
        && namespace.bytes().all(|b| b.is_ascii_uppercase())
        && (1..=MAX_NUMBER_LEN).contains(&number.len())
        && number.bytes().all(|b| b.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// RiskId
// ---------------------------------------------------------------------------

/// Identifier of a risk in the registry taxonomy.
///
/// `Ord` is plain lexical order on the canonical string, which is the
/// final tie-break when candidate sets are truncated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RiskId(String);

impl_validating_deserialize!(RiskId);

impl RiskId {
    /// Create a risk identifier, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRiskId`] if the value is not exactly
    /// `R.<NAMESPACE>.<NUMBER>`. No trimming or case folding is applied.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        if is_namespaced_id(&raw, "R") {
            Ok(Self(raw))
        } else {
            Err(ValidationError::InvalidRiskId(raw))
        }
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace segment, e.g. `AIR` for `R.AIR.001`.
    pub fn namespace(&self) -> &str {
        self.0.split('.').nth(1).unwrap_or_default()
    }
}

impl std::fmt::Display for RiskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for RiskId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// ControlId
// ---------------------------------------------------------------------------

/// Identifier of a mitigating control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ControlId(String);

impl_validating_deserialize!(ControlId);

impl ControlId {
    /// Create a control identifier, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidControlId`] if the value is not
    /// exactly `C.<NAMESPACE>.<NUMBER>`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        if is_namespaced_id(&raw, "C") {
            Ok(Self(raw))
        } else {
            Err(ValidationError::InvalidControlId(raw))
        }
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Keyword
// ---------------------------------------------------------------------------

/// A sanitized search keyword.
///
/// The only path from model output to a registry query. Lowercase ASCII
/// letters and digits, single spaces, `-` and `_`; at most
/// [`MAX_KEYWORD_CHARS`] characters; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Keyword(String);

impl_validating_deserialize!(Keyword);

impl Keyword {
    /// Sanitize raw text into a keyword.
    ///
    /// Characters outside the allowed set are dropped, whitespace runs
    /// collapse to one space, and the result is capped at
    /// [`MAX_KEYWORD_CHARS`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyKeyword`] if nothing survives.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = value.into();
        let mut out = String::with_capacity(raw.len().min(MAX_KEYWORD_CHARS));
        let mut pending_space = false;
        for c in raw.chars() {
            if c.is_whitespace() {
                pending_space = !out.is_empty();
                continue;
            }
            if !(c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                continue;
            }
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c.to_ascii_lowercase());
            if out.len() >= MAX_KEYWORD_CHARS {
                break;
            }
        }
        out.truncate(MAX_KEYWORD_CHARS);
        let trimmed_len = out.trim_end().len();
        out.truncate(trimmed_len);

        if out.is_empty() {
            Err(ValidationError::EmptyKeyword(raw))
        } else {
            Ok(Self(out))
        }
    }

    /// Access the keyword as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

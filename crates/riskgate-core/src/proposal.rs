//! # Proposals and Normalization
//!
//! A [`Proposal`] is the caller's free text plus optional metadata. The
//! structured [`ProposalDocument`] accepted by the transports renders to
//! that text deterministically.
//!
//! [`ProposalNormalizer`] is the first pipeline stage. It cleans line
//! endings, control characters and whitespace runs, then bounds the text.
//! Oversized input is rejected, never truncated: a truncated proposal
//! would silently bias keyword extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;

/// Default character cap applied by [`ProposalNormalizer`].
pub const DEFAULT_MAX_PROPOSAL_CHARS: usize = 20_000;

/// Optional descriptive metadata carried alongside the proposal text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Call-for-proposals identifier the proposal responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfp_id: Option<String>,
}

/// A proposal as received. Immutable for the lifetime of one assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub text: String,
    #[serde(default)]
    pub metadata: ProposalMetadata,
}

impl Proposal {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: ProposalMetadata::default(),
        }
    }

    pub fn with_metadata(text: impl Into<String>, metadata: ProposalMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

// ---------------------------------------------------------------------------
// Structured document
// ---------------------------------------------------------------------------

/// Structured proposal as submitted through the HTTP API or a JSON file.
///
/// Only `description` is required. Unknown top-level keys are ignored;
/// free-form extras go in `additional_fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfp_id: Option<String>,
    #[serde(default, alias = "title", skip_serializing_if = "Option::is_none")]
    pub proposal_title: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_approach: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_governance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_governance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_measures: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional_fields: BTreeMap<String, serde_json::Value>,
}

impl ProposalDocument {
    /// Render the document as labelled paragraphs separated by blank lines.
    ///
    /// Section order is fixed; empty sections are skipped. Additional
    /// fields follow in key order. A blank description renders nothing at
    /// all, so the normalizer rejects the document as empty instead of
    /// assessing a title or boilerplate on its own.
    pub fn to_text(&self) -> String {
        if self.description.trim().is_empty() {
            return String::new();
        }

        let mut sections: Vec<String> = Vec::new();
        let mut push = |label: &str, value: Option<&str>| {
            if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
                sections.push(format!("{label}: {v}"));
            }
        };

        push("Title", self.proposal_title.as_deref());
        push("Description", Some(self.description.as_str()));
        push("Technical Approach", self.technical_approach.as_deref());
        let sources = self.data_sources.join(", ");
        push("Data Sources", Some(sources.as_str()));
        push("Deployment", self.deployment.as_deref());
        push("Data Governance", self.data_governance.as_deref());
        push("Model Governance", self.model_governance.as_deref());
        push("Security Measures", self.security_measures.as_deref());

        for (key, value) in &self.additional_fields {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            push(key.as_str(), Some(rendered.as_str()));
        }

        sections.join("\n\n")
    }

    /// Metadata carried alongside the rendered text.
    pub fn metadata(&self) -> ProposalMetadata {
        ProposalMetadata {
            title: self.proposal_title.clone(),
            sector: self.sector.clone(),
            cfp_id: self.cfp_id.clone(),
        }
    }

    /// Convert into a [`Proposal`] ready for normalization.
    pub fn into_proposal(self) -> Proposal {
        Proposal::with_metadata(self.to_text(), self.metadata())
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Normalized, bounded proposal text. Produced only by [`ProposalNormalizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedProposal {
    text: String,
    metadata: ProposalMetadata,
    char_count: usize,
}

impl NormalizedProposal {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn metadata(&self) -> &ProposalMetadata {
        &self.metadata
    }

    /// Length of the normalized text in characters.
    pub fn char_count(&self) -> usize {
        self.char_count
    }
}

/// Cleans and bounds raw proposal text. Pure; no side effects.
#[derive(Debug, Clone, Copy)]
pub struct ProposalNormalizer {
    max_chars: usize,
}

impl Default for ProposalNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROPOSAL_CHARS)
    }
}

impl ProposalNormalizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Normalize a proposal.
    ///
    /// # Errors
    ///
    /// - [`InvalidInput::EmptyProposal`] if nothing but whitespace remains.
    /// - [`InvalidInput::ProposalTooLong`] if the normalized text exceeds
    ///   the cap. The length is measured after normalization, so padding
    ///   with whitespace cannot push a proposal over the limit.
    pub fn normalize(&self, proposal: &Proposal) -> Result<NormalizedProposal, InvalidInput> {
        let text = normalize_text(&proposal.text);
        if text.is_empty() {
            return Err(InvalidInput::EmptyProposal);
        }
        let char_count = text.chars().count();
        if char_count > self.max_chars {
            return Err(InvalidInput::ProposalTooLong {
                len: char_count,
                max: self.max_chars,
            });
        }
        Ok(NormalizedProposal {
            text,
            metadata: proposal.metadata.clone(),
            char_count,
        })
    }
}

/// Line endings to `\n`, control characters dropped, each line trimmed
/// with inner blank runs collapsed, at most one empty line in a row.
fn normalize_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;

    for line in unified.split('\n') {
        let cleaned = collapse_line(line);
        if cleaned.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(&cleaned);
        blank_run = 0;
    }
    out
}

fn collapse_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending_space = false;
    for c in line.chars() {
        if c == '\t' || c == ' ' || (c.is_whitespace() && c != '\n') {
            pending_space = !out.is_empty();
            continue;
        }
        if c.is_control() || c == '\u{feff}' {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_line_endings() {
        let p = Proposal::new("  We want\t\tto build \r\n\r\n\r\n\r\na   chatbot.\r\n");
        let n = ProposalNormalizer::default().normalize(&p).unwrap();
        assert_eq!(n.text(), "We want to build\n\na chatbot.");
        assert_eq!(n.char_count(), n.text().chars().count());
    }

    #[test]
    fn normalize_keeps_single_line_breaks() {
        let p = Proposal::new("line one\nline two\n\nparagraph");
        let n = ProposalNormalizer::default().normalize(&p).unwrap();
        assert_eq!(n.text(), "line one\nline two\n\nparagraph");
    }

    #[test]
    fn normalize_strips_control_characters() {
        let p = Proposal::new("\u{feff}risk\u{0007}y\u{0000} model");
        let n = ProposalNormalizer::default().normalize(&p).unwrap();
        assert_eq!(n.text(), "risky model");
    }

    #[test]
    fn normalize_rejects_empty() {
        let normalizer = ProposalNormalizer::default();
        for raw in ["", "   ", "\n\n\t\r\n", "\u{0000}\u{0001}"] {
            assert_eq!(
                normalizer.normalize(&Proposal::new(raw)),
                Err(InvalidInput::EmptyProposal),
                "{raw:?}"
            );
        }
    }

    #[test]
    fn normalize_rejects_over_cap_without_truncating() {
        let normalizer = ProposalNormalizer::new(10);
        let err = normalizer
            .normalize(&Proposal::new("abcdefghijk"))
            .unwrap_err();
        assert_eq!(err, InvalidInput::ProposalTooLong { len: 11, max: 10 });
    }

    #[test]
    fn normalize_measures_after_whitespace_collapse() {
        let normalizer = ProposalNormalizer::new(10);
        let n = normalizer
            .normalize(&Proposal::new("   abc      def   "))
            .unwrap();
        assert_eq!(n.text(), "abc def");
    }

    #[test]
    fn normalize_counts_chars_not_bytes() {
        let normalizer = ProposalNormalizer::new(4);
        assert!(normalizer.normalize(&Proposal::new("ééé")).is_ok());
    }

    #[test]
    fn normalize_carries_metadata() {
        let meta = ProposalMetadata {
            title: Some("Chatbot".into()),
            sector: Some("health".into()),
            cfp_id: None,
        };
        let p = Proposal::with_metadata("text", meta.clone());
        let n = ProposalNormalizer::default().normalize(&p).unwrap();
        assert_eq!(n.metadata(), &meta);
    }

    #[test]
    fn document_renders_sections_in_order() {
        let mut doc = ProposalDocument {
            proposal_title: Some("AI Triage".into()),
            description: "Triage patients.".into(),
            technical_approach: Some("Fine-tuned LLM".into()),
            data_sources: vec!["EHR".into(), "claims".into()],
            security_measures: Some("  ".into()),
            ..Default::default()
        };
        doc.additional_fields
            .insert("budget".into(), serde_json::json!(12000));
        doc.additional_fields
            .insert("Region".into(), serde_json::json!("EU"));

        assert_eq!(
            doc.to_text(),
            "Title: AI Triage\n\nDescription: Triage patients.\n\n\
             Technical Approach: Fine-tuned LLM\n\nData Sources: EHR, claims\n\n\
             Region: EU\n\nbudget: 12000"
        );
    }

    #[test]
    fn document_accepts_title_alias_and_ignores_unknown_keys() {
        let doc: ProposalDocument = serde_json::from_value(serde_json::json!({
            "title": "Chatbot",
            "description": "We want to build a chatbot",
            "unexpected": true
        }))
        .unwrap();
        let proposal = doc.into_proposal();
        assert_eq!(proposal.metadata.title.as_deref(), Some("Chatbot"));
        assert!(proposal.text.starts_with("Title: Chatbot"));
    }

    #[test]
    fn blank_description_with_title_is_rejected_as_empty() {
        let doc: ProposalDocument = serde_json::from_value(serde_json::json!({
            "title": "Chatbot",
            "description": "  \n\t ",
            "technical_approach": "Fine-tuned LLM"
        }))
        .unwrap();
        assert_eq!(doc.to_text(), "");
        let proposal = doc.into_proposal();
        assert_eq!(proposal.metadata.title.as_deref(), Some("Chatbot"));
        assert_eq!(
            ProposalNormalizer::default().normalize(&proposal),
            Err(InvalidInput::EmptyProposal)
        );
    }

    #[test]
    fn document_requires_description() {
        let res: Result<ProposalDocument, _> =
            serde_json::from_value(serde_json::json!({ "title": "x" }));
        assert!(res.is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalization_is_idempotent(raw in "[ a-zA-Z0-9\t\r\n.,]{0,300}") {
                let normalizer = ProposalNormalizer::default();
                if let Ok(first) = normalizer.normalize(&Proposal::new(raw)) {
                    let second = normalizer
                        .normalize(&Proposal::new(first.text()))
                        .unwrap();
                    prop_assert_eq!(first.text(), second.text());
                }
            }

            #[test]
            fn normalized_text_is_never_padded(raw in "\\PC{0,200}") {
                if let Ok(n) = ProposalNormalizer::default().normalize(&Proposal::new(raw)) {
                    prop_assert!(!n.text().is_empty());
                    prop_assert_eq!(n.text().trim(), n.text());
                    prop_assert!(!n.text().contains("\n\n\n"));
                }
            }
        }
    }
}

//! # Keyword Extraction
//!
//! Turns proposal text into a short list of sanitized [`Keyword`]s. This is
//! the only route by which model output influences registry queries, so
//! every string the model returns passes through [`Keyword::new`] before it
//! is used.

use std::sync::Arc;

use riskgate_core::{Keyword, NormalizedProposal};
use riskgate_llm::{KeywordRequest, LlmClient, LlmError};
use uuid::Uuid;

use crate::config::{MalformedPolicy, PipelineConfig};
use crate::error::StageError;
use crate::retry::call_model;

/// Keywords selected for retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordOutcome {
    pub keywords: Vec<Keyword>,
    /// The model output was unusable and the configured fallback keywords
    /// were substituted.
    pub fallback: bool,
}

/// Sanitize raw model keywords: drop anything that does not survive
/// [`Keyword::new`], deduplicate preserving first occurrence, cap at `max`.
pub fn sanitize_keywords<S: AsRef<str>>(raw: &[S], max: usize) -> Vec<Keyword> {
    let mut out: Vec<Keyword> = Vec::with_capacity(max.min(raw.len()));
    for item in raw {
        if out.len() >= max {
            break;
        }
        if let Ok(kw) = Keyword::new(item.as_ref()) {
            if !out.contains(&kw) {
                out.push(kw);
            }
        }
    }
    out
}

/// Keyword-extraction stage.
#[derive(Clone)]
pub struct KeywordExtractor {
    llm: Arc<dyn LlmClient>,
    config: Arc<PipelineConfig>,
}

impl KeywordExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, config: Arc<PipelineConfig>) -> Self {
        Self { llm, config }
    }

    /// Extract keywords, re-prompting once on malformed output and then
    /// applying the malformed-output policy.
    pub async fn extract(
        &self,
        assessment_id: Uuid,
        proposal: &NormalizedProposal,
    ) -> Result<KeywordOutcome, StageError> {
        for attempt in 0..=self.config.malformed_reprompts {
            let request = KeywordRequest {
                text: proposal.text().to_string(),
                max_keywords: self.config.max_keywords,
                reprompt: attempt > 0,
            };
            let result = call_model(&self.config, assessment_id, "extract_keywords", || {
                self.llm.extract_keywords(&request)
            })
            .await;

            match result {
                Ok(payload) => {
                    let keywords = sanitize_keywords(&payload.keywords, self.config.max_keywords);
                    if !keywords.is_empty() {
                        tracing::debug!(
                            assessment_id = %assessment_id,
                            returned = payload.keywords.len(),
                            kept = keywords.len(),
                            "keywords sanitized"
                        );
                        return Ok(KeywordOutcome {
                            keywords,
                            fallback: false,
                        });
                    }
                    tracing::warn!(
                        assessment_id = %assessment_id,
                        attempt,
                        "no usable keywords after sanitization"
                    );
                }
                Err(LlmError::Malformed { .. }) => {
                    tracing::warn!(
                        assessment_id = %assessment_id,
                        attempt,
                        "keyword response malformed"
                    );
                }
                Err(e) => return Err(StageError::from(e)),
            }
        }

        match self.config.malformed_policy {
            MalformedPolicy::Fail => Err(StageError::malformed(
                "keyword extraction produced no usable keywords",
            )),
            MalformedPolicy::Degrade => {
                let keywords = self.config.fallback_keywords();
                if keywords.is_empty() {
                    return Err(StageError::malformed(
                        "keyword extraction produced no usable keywords and no fallback is configured",
                    ));
                }
                tracing::warn!(
                    assessment_id = %assessment_id,
                    fallback = keywords.len(),
                    "using fallback keywords"
                );
                Ok(KeywordOutcome {
                    keywords,
                    fallback: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_drops_empty_and_duplicates() {
        let raw = ["Data Privacy", "data   privacy", "!!!", "Model-Bias", "  "];
        let kws: Vec<_> = sanitize_keywords(&raw, 5)
            .into_iter()
            .map(|k| k.as_str().to_string())
            .collect();
        assert_eq!(kws, vec!["data privacy", "model-bias"]);
    }

    #[test]
    fn sanitize_caps_at_max_in_model_order() {
        let raw = ["a", "b", "c", "d"];
        let kws: Vec<_> = sanitize_keywords(&raw, 2)
            .into_iter()
            .map(|k| k.as_str().to_string())
            .collect();
        assert_eq!(kws, vec!["a", "b"]);
    }

    #[test]
    fn sanitize_strips_query_syntax() {
        let raw = ["privacy'; DROP TABLE risks;--"];
        let kws = sanitize_keywords(&raw, 5);
        assert_eq!(kws[0].as_str(), "privacy drop table risks--");
    }
}

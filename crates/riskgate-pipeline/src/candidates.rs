//! # Candidate Retrieval
//!
//! Queries the registry once per keyword and merges the results into a
//! bounded [`CandidateSet`]. Ordering is fully determined by the inputs:
//!
//! 1. more distinct matching keywords first,
//! 2. then the best (lowest) position in any keyword's result list,
//! 3. then [`RiskId`] lexical order.

use std::collections::HashMap;
use std::sync::Arc;

use riskgate_core::{CandidateSet, Keyword, RiskId, RiskRecord};
use riskgate_registry::RiskRegistry;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::StageError;

/// Result of the retrieval stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateOutcome {
    pub candidates: CandidateSet,
    /// Set when the first pass found nothing and the fallback keywords
    /// were used for a second pass.
    pub fallback_keywords: Option<Vec<Keyword>>,
}

struct Tally {
    record: RiskRecord,
    matches: usize,
    best_position: usize,
}

/// Merge per-keyword registry results into an ordered, truncated set.
///
/// `results` holds one entry per keyword, in keyword order, each list in
/// registry-native order. A risk listed twice under the same keyword counts
/// once for that keyword.
pub fn merge_candidates(results: &[Vec<RiskRecord>], max: usize) -> CandidateSet {
    let mut tallies: HashMap<RiskId, Tally> = HashMap::new();

    for records in results {
        let mut seen_for_keyword: Vec<&RiskId> = Vec::new();
        for (position, record) in records.iter().enumerate() {
            if seen_for_keyword.contains(&&record.id) {
                continue;
            }
            seen_for_keyword.push(&record.id);
            tallies
                .entry(record.id.clone())
                .and_modify(|t| {
                    t.matches += 1;
                    t.best_position = t.best_position.min(position);
                })
                .or_insert_with(|| Tally {
                    record: record.clone(),
                    matches: 1,
                    best_position: position,
                });
        }
    }

    let mut ordered: Vec<Tally> = tallies.into_values().collect();
    ordered.sort_by(|a, b| {
        b.matches
            .cmp(&a.matches)
            .then(a.best_position.cmp(&b.best_position))
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    CandidateSet::new(ordered.into_iter().map(|t| t.record), max)
}

/// Candidate-retrieval stage.
#[derive(Clone)]
pub struct CandidateRetriever {
    registry: Arc<dyn RiskRegistry>,
    config: Arc<PipelineConfig>,
}

impl CandidateRetriever {
    pub fn new(registry: Arc<dyn RiskRegistry>, config: Arc<PipelineConfig>) -> Self {
        Self { registry, config }
    }

    /// Gather candidates for `keywords`. When nothing matches and
    /// `allow_fallback` is set, retry once with the configured fallback
    /// keywords. Registry failures are fatal.
    pub async fn gather(
        &self,
        assessment_id: Uuid,
        keywords: &[Keyword],
        allow_fallback: bool,
    ) -> Result<CandidateOutcome, StageError> {
        let candidates = self.query(keywords).await?;
        if !candidates.is_empty() || !allow_fallback {
            return Ok(CandidateOutcome {
                candidates,
                fallback_keywords: None,
            });
        }

        let fallback: Vec<Keyword> = self
            .config
            .fallback_keywords()
            .into_iter()
            .filter(|k| !keywords.contains(k))
            .collect();
        if fallback.is_empty() {
            return Ok(CandidateOutcome {
                candidates,
                fallback_keywords: None,
            });
        }

        tracing::warn!(
            assessment_id = %assessment_id,
            keywords = keywords.len(),
            "no candidates matched; retrying with fallback keywords"
        );
        let candidates = self.query(&fallback).await?;
        Ok(CandidateOutcome {
            candidates,
            fallback_keywords: Some(fallback),
        })
    }

    async fn query(&self, keywords: &[Keyword]) -> Result<CandidateSet, StageError> {
        let mut results = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let records = self.registry.find_risks_by_keyword(keyword).await?;
            results.push(records);
        }
        Ok(merge_candidates(&results, self.config.max_candidates))
    }
}

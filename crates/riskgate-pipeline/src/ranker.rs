//! Risk ranking stage.
//!
//! Presents the candidate set to the model as identifier + title pairs and
//! returns the model's ranking as an untrusted payload for
//! [`validate_ranking`](crate::validator::validate_ranking).

use std::sync::Arc;

use riskgate_core::{CandidateSet, NormalizedProposal};
use riskgate_llm::{LlmClient, LlmError, RankingCandidate, RankingPayload, RankingRequest};
use uuid::Uuid;

use crate::config::{MalformedPolicy, PipelineConfig};
use crate::error::StageError;
use crate::retry::call_model;

/// What the ranking stage produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankOutcome {
    /// A well-formed (but still untrusted) ranking.
    Ranked(RankingPayload),
    /// Output stayed malformed and the degrade policy applies.
    Degraded { reason: String },
}

#[derive(Clone)]
pub struct RiskRanker {
    llm: Arc<dyn LlmClient>,
    config: Arc<PipelineConfig>,
}

impl RiskRanker {
    pub fn new(llm: Arc<dyn LlmClient>, config: Arc<PipelineConfig>) -> Self {
        Self { llm, config }
    }

    pub async fn rank(
        &self,
        assessment_id: Uuid,
        proposal: &NormalizedProposal,
        candidates: &CandidateSet,
        top_n: usize,
    ) -> Result<RankOutcome, StageError> {
        let listed: Vec<RankingCandidate> = candidates
            .iter()
            .map(|r| RankingCandidate {
                risk_id: r.id.clone(),
                title: r.title.clone(),
            })
            .collect();

        for attempt in 0..=self.config.malformed_reprompts {
            let request = RankingRequest {
                text: proposal.text().to_string(),
                candidates: listed.clone(),
                top_n,
                reprompt: attempt > 0,
            };
            let result = call_model(&self.config, assessment_id, "rank_risks", || {
                self.llm.rank_risks(&request)
            })
            .await;

            match result {
                Ok(payload) => {
                    tracing::debug!(
                        assessment_id = %assessment_id,
                        entries = payload.risks.len(),
                        candidates = listed.len(),
                        "ranking received"
                    );
                    return Ok(RankOutcome::Ranked(payload));
                }
                Err(LlmError::Malformed { .. }) => {
                    tracing::warn!(
                        assessment_id = %assessment_id,
                        attempt,
                        "ranking response malformed"
                    );
                }
                Err(e) => return Err(StageError::from(e)),
            }
        }

        match self.config.malformed_policy {
            MalformedPolicy::Fail => Err(StageError::malformed(
                "ranking response did not match the expected shape",
            )),
            MalformedPolicy::Degrade => Ok(RankOutcome::Degraded {
                reason: "ranking output malformed after re-prompt".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use riskgate_core::{FailureReason, Proposal, ProposalNormalizer, RiskId, RiskRecord};
    use riskgate_llm::{KeywordPayload, KeywordRequest, RawRankedRisk};

    /// Always answers the ranking call with a malformed response, or with
    /// one entry when `well_formed` is set.
    struct RankingLlm {
        well_formed: bool,
        reprompts: Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl LlmClient for RankingLlm {
        async fn extract_keywords(&self, _: &KeywordRequest) -> Result<KeywordPayload, LlmError> {
            Ok(KeywordPayload {
                keywords: vec![],
                confidence: None,
            })
        }

        async fn rank_risks(&self, request: &RankingRequest) -> Result<RankingPayload, LlmError> {
            self.reprompts.lock().push(request.reprompt);
            if self.well_formed {
                return Ok(RankingPayload {
                    risks: vec![RawRankedRisk {
                        risk_id: request.candidates[0].risk_id.to_string(),
                        rank: Some(1),
                        rationale: None,
                    }],
                });
            }
            Err(LlmError::Malformed {
                reason: "not json".into(),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "ranking"
        }
    }

    fn candidates() -> CandidateSet {
        CandidateSet::new(
            vec![RiskRecord {
                id: RiskId::new("R.T.1").unwrap(),
                title: "Privacy".into(),
                description: String::new(),
                keywords: vec![],
            }],
            10,
        )
    }

    async fn rank_with(
        well_formed: bool,
        policy: MalformedPolicy,
    ) -> (Result<RankOutcome, StageError>, Vec<bool>) {
        let llm = Arc::new(RankingLlm {
            well_formed,
            reprompts: Mutex::new(Vec::new()),
        });
        let config = PipelineConfig {
            malformed_policy: policy,
            retry_base_delay_ms: 1,
            ..PipelineConfig::default()
        };
        let ranker = RiskRanker::new(llm.clone(), Arc::new(config));
        let proposal = ProposalNormalizer::default()
            .normalize(&Proposal::new("customer chatbot"))
            .unwrap();
        let outcome = ranker.rank(Uuid::nil(), &proposal, &candidates(), 3).await;
        let calls = llm.reprompts.lock().clone();
        (outcome, calls)
    }

    #[tokio::test]
    async fn well_formed_ranking_is_returned_untouched() {
        let (outcome, calls) = rank_with(true, MalformedPolicy::Degrade).await;
        match outcome.unwrap() {
            RankOutcome::Ranked(payload) => assert_eq!(payload.risks[0].risk_id, "R.T.1"),
            other => panic!("expected ranking, got {other:?}"),
        }
        assert_eq!(calls, vec![false]);
    }

    #[tokio::test]
    async fn malformed_twice_degrades_under_degrade_policy() {
        let (outcome, calls) = rank_with(false, MalformedPolicy::Degrade).await;
        assert!(matches!(outcome.unwrap(), RankOutcome::Degraded { .. }));
        assert_eq!(calls, vec![false, true]);
    }

    #[tokio::test]
    async fn malformed_twice_fails_under_fail_policy() {
        let (outcome, _) = rank_with(false, MalformedPolicy::Fail).await;
        assert_eq!(
            outcome.unwrap_err().reason,
            FailureReason::ModelOutputMalformed
        );
    }
}

//! # Pipeline Orchestrator
//!
//! Runs one assessment through every stage in order and decides what is
//! fatal and what is recoverable. It is the only component that holds
//! cross-stage state, and that state lives for one call only; the
//! orchestrator itself holds `Arc` handles to shared clients and immutable
//! configuration, so one instance serves concurrent assessments.
//!
//! ## Deadlines and Cancellation
//!
//! The whole run is raced against the assessment deadline and the caller's
//! cancellation signal. Whichever wins, the in-flight stage future is
//! dropped and the assessment fails at the stage that was active.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use riskgate_core::{
    AssessmentFailure, AssessmentOutcome, AssessmentResult, AssessmentStatus, Caveat,
    FailureReason, InvalidInput, Proposal, ProposalNormalizer, Stage,
};
use riskgate_llm::LlmClient;
use riskgate_registry::RiskRegistry;

use crate::candidates::CandidateRetriever;
use crate::config::{ConfigError, PipelineConfig};
use crate::enricher::ControlEnricher;
use crate::error::StageError;
use crate::keywords::KeywordExtractor;
use crate::ranker::{RankOutcome, RiskRanker};
use crate::state::{AssessmentMachine, AssessmentState};
use crate::validator::{validate_ranking, RejectionKind};

/// Entry point for risk assessments.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    config: Arc<PipelineConfig>,
    llm: Arc<dyn LlmClient>,
    registry: Arc<dyn RiskRegistry>,
    normalizer: ProposalNormalizer,
    keywords: KeywordExtractor,
    retriever: CandidateRetriever,
    ranker: RiskRanker,
    enricher: ControlEnricher,
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("llm", &self.llm.model_name())
            .field("registry", &self.registry.name())
            .field("config", &self.config)
            .finish()
    }
}

impl PipelineOrchestrator {
    /// Build an orchestrator. The configuration is validated here.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: Arc<dyn RiskRegistry>,
        config: PipelineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        Ok(Self {
            normalizer: ProposalNormalizer::new(config.max_proposal_chars),
            keywords: KeywordExtractor::new(llm.clone(), config.clone()),
            retriever: CandidateRetriever::new(registry.clone(), config.clone()),
            ranker: RiskRanker::new(llm.clone(), config.clone()),
            enricher: ControlEnricher::new(registry.clone(), config.clone()),
            config,
            llm,
            registry,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    pub fn registry(&self) -> &Arc<dyn RiskRegistry> {
        &self.registry
    }

    /// Assess a proposal. `top_n` defaults to the configured value.
    pub async fn assess(&self, proposal: Proposal, top_n: Option<usize>) -> AssessmentOutcome {
        let (_keep_open, cancel) = watch::channel(false);
        self.assess_with_cancel(proposal, top_n, cancel).await
    }

    /// Assess a proposal, failing with `Cancelled` as soon as `cancel`
    /// becomes `true`.
    pub async fn assess_with_cancel(
        &self,
        proposal: Proposal,
        top_n: Option<usize>,
        mut cancel: watch::Receiver<bool>,
    ) -> AssessmentOutcome {
        let id = Uuid::new_v4();
        let machine = Mutex::new(AssessmentMachine::new(id));
        tracing::info!(assessment_id = %id, chars = proposal.text.len(), "assessment received");

        let timeout = self.config.assessment_timeout();
        let deadline = tokio::time::sleep(timeout);
        let run = self.run(id, &machine, &proposal, top_n);
        tokio::pin!(deadline);
        tokio::pin!(run);

        let result = tokio::select! {
            biased;
            _ = wait_for_cancel(&mut cancel) => {
                Err(StageError::new(FailureReason::Cancelled, "assessment cancelled by caller"))
            }
            _ = &mut deadline => {
                Err(StageError::new(
                    FailureReason::Timeout,
                    format!("assessment exceeded its {}ms deadline", timeout.as_millis()),
                ))
            }
            result = &mut run => result,
        };

        result.map_err(|err| {
            let mut machine = machine.lock();
            let stage = machine.fail(err.reason).unwrap_or_else(|e| {
                tracing::error!(assessment_id = %id, "{e}");
                Stage::Enrich
            });
            tracing::error!(
                assessment_id = %id,
                stage = %stage,
                reason = %err.reason,
                "assessment failed: {}",
                err.detail
            );
            AssessmentFailure {
                assessment_id: id,
                stage,
                reason: err.reason,
                detail: err.detail,
            }
        })
    }

    async fn run(
        &self,
        id: Uuid,
        machine: &Mutex<AssessmentMachine>,
        proposal: &Proposal,
        top_n: Option<usize>,
    ) -> Result<AssessmentResult, StageError> {
        let mut degraded: Vec<String> = Vec::new();
        let mut caveats: Vec<Caveat> = Vec::new();

        // ── Normalize ──
        let top_n = self.resolve_top_n(top_n)?;
        let normalized = self.normalizer.normalize(proposal)?;
        enter(machine, AssessmentState::Normalized);
        tracing::info!(
            assessment_id = %id,
            stage = %Stage::Normalize,
            chars = normalized.char_count(),
            top_n,
            "proposal normalized"
        );

        // ── Extract keywords ──
        let extracted = self.keywords.extract(id, &normalized).await?;
        enter(machine, AssessmentState::KeywordsExtracted);
        if extracted.fallback {
            degraded.push("keyword extraction output malformed; fallback keywords used".into());
            caveats.push(Caveat::FallbackKeywords {
                keywords: extracted.keywords.clone(),
            });
        }
        tracing::info!(
            assessment_id = %id,
            stage = %Stage::ExtractKeywords,
            keywords = extracted.keywords.len(),
            fallback = extracted.fallback,
            "keywords extracted"
        );

        // ── Gather candidates ──
        let gathered = self
            .retriever
            .gather(id, &extracted.keywords, !extracted.fallback)
            .await?;
        enter(machine, AssessmentState::CandidatesGathered);
        if let Some(keywords) = &gathered.fallback_keywords {
            caveats.push(Caveat::FallbackKeywords {
                keywords: keywords.clone(),
            });
        }
        let candidates = gathered.candidates;
        if candidates.is_empty() {
            caveats.push(Caveat::NoCandidates);
        }
        tracing::info!(
            assessment_id = %id,
            stage = %Stage::GatherCandidates,
            candidates = candidates.len(),
            "candidates gathered"
        );

        // ── Rank ──
        let ranking = if candidates.is_empty() {
            None
        } else {
            Some(self.ranker.rank(id, &normalized, &candidates, top_n).await?)
        };
        enter(machine, AssessmentState::Ranked);
        tracing::info!(
            assessment_id = %id,
            stage = %Stage::Rank,
            skipped = ranking.is_none(),
            "ranking stage finished"
        );

        // ── Validate ──
        let ranked = match ranking {
            None => Vec::new(),
            Some(RankOutcome::Degraded { reason }) => {
                tracing::warn!(assessment_id = %id, "ranking degraded: {reason}");
                degraded.push(reason);
                Vec::new()
            }
            Some(RankOutcome::Ranked(payload)) => {
                let report = validate_ranking(
                    &payload,
                    &candidates,
                    top_n,
                    self.config.max_rejected_fraction,
                );
                if report.rejected() > 0 {
                    tracing::warn!(
                        assessment_id = %id,
                        malformed = report.count(RejectionKind::MalformedIdentifier),
                        not_in_candidates = report.count(RejectionKind::NotInCandidates),
                        duplicate = report.count(RejectionKind::Duplicate),
                        total = report.total,
                        "ranked entries rejected"
                    );
                    caveats.push(Caveat::ValidationRejections {
                        rejected: report.rejected(),
                        total: report.total,
                    });
                }
                if let Some(reason) = report.degraded {
                    degraded.push(reason);
                }
                report.ranked
            }
        };
        enter(machine, AssessmentState::Validated);
        tracing::info!(
            assessment_id = %id,
            stage = %Stage::Validate,
            accepted = ranked.len(),
            "ranking validated"
        );

        // ── Enrich ──
        let enrichment = self.enricher.enrich(id, &ranked, &candidates).await?;
        enter(machine, AssessmentState::Enriched);
        tracing::info!(
            assessment_id = %id,
            stage = %Stage::Enrich,
            unavailable = enrichment.unavailable.len(),
            "controls attached"
        );

        let risks = enrichment.risks;
        if risks.len() < top_n {
            caveats.push(Caveat::FewerThanRequested {
                requested: top_n,
                returned: risks.len(),
            });
        }
        if !enrichment.unavailable.is_empty() {
            caveats.push(Caveat::PartiallyEnriched {
                risk_ids: enrichment.unavailable,
            });
        }

        let status = if degraded.is_empty() {
            AssessmentStatus::Completed
        } else {
            AssessmentStatus::Degraded {
                reason: degraded.join("; "),
            }
        };

        let created_at = {
            let mut machine = machine.lock();
            if let Err(e) = machine.transition(AssessmentState::Completed) {
                tracing::error!(assessment_id = %id, "{e}");
            }
            machine.created_at()
        };
        tracing::info!(
            assessment_id = %id,
            risks = risks.len(),
            degraded = !matches!(status, AssessmentStatus::Completed),
            "assessment completed"
        );

        Ok(AssessmentResult {
            assessment_id: id,
            created_at,
            status,
            requested_top_n: top_n,
            keywords: extracted.keywords,
            risks,
            caveats,
        })
    }

    fn resolve_top_n(&self, requested: Option<usize>) -> Result<usize, InvalidInput> {
        let top_n = requested.unwrap_or(self.config.default_top_n);
        if top_n == 0 || top_n > self.config.max_top_n {
            return Err(InvalidInput::TopNOutOfRange {
                requested: top_n,
                max: self.config.max_top_n,
            });
        }
        Ok(top_n)
    }
}

/// Record a forward transition. The run visits states in order, so a
/// rejection here indicates a logic error and is logged.
fn enter(machine: &Mutex<AssessmentMachine>, next: AssessmentState) {
    let mut machine = machine.lock();
    if let Err(e) = machine.transition(next) {
        tracing::error!(assessment_id = %machine.id(), "{e}");
    }
}

/// Resolve once the flag is `true`. A closed channel never cancels.
async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

//! Control enrichment stage.
//!
//! Attaches registry controls to each validated risk. A risk with no
//! controls is kept with an empty list. Registry failures either fail the
//! assessment or, with `degrade_enrichment`, mark the affected risks
//! [`EnrichmentStatus::Unavailable`].

use std::sync::Arc;

use riskgate_core::{AssessedRisk, CandidateSet, EnrichmentStatus, RankedRisk, RiskId};
use riskgate_registry::RiskRegistry;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::StageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentOutcome {
    pub risks: Vec<AssessedRisk>,
    /// Risks whose controls could not be fetched.
    pub unavailable: Vec<RiskId>,
}

#[derive(Clone)]
pub struct ControlEnricher {
    registry: Arc<dyn RiskRegistry>,
    config: Arc<PipelineConfig>,
}

impl ControlEnricher {
    pub fn new(registry: Arc<dyn RiskRegistry>, config: Arc<PipelineConfig>) -> Self {
        Self { registry, config }
    }

    /// Enrich `ranked` in order. Titles and descriptions come from the
    /// candidate records, never from the model.
    pub async fn enrich(
        &self,
        assessment_id: Uuid,
        ranked: &[RankedRisk],
        candidates: &CandidateSet,
    ) -> Result<EnrichmentOutcome, StageError> {
        let mut risks = Vec::with_capacity(ranked.len());
        let mut unavailable = Vec::new();

        for risk in ranked {
            let (controls, enrichment) = match self.registry.get_controls(&risk.risk_id).await {
                Ok(controls) => (controls, EnrichmentStatus::Enriched),
                Err(e) if self.config.degrade_enrichment => {
                    tracing::warn!(
                        assessment_id = %assessment_id,
                        risk_id = %risk.risk_id,
                        "control lookup failed, continuing without controls: {e}"
                    );
                    unavailable.push(risk.risk_id.clone());
                    (Vec::new(), EnrichmentStatus::Unavailable)
                }
                Err(e) => return Err(StageError::from(e)),
            };

            let (title, description) = candidates
                .get(&risk.risk_id)
                .map(|r| (r.title.clone(), r.description.clone()))
                .unwrap_or_default();

            risks.push(AssessedRisk {
                rank: risk.rank,
                risk_id: risk.risk_id.clone(),
                title,
                description,
                rationale: risk.rationale.clone(),
                controls,
                enrichment,
            });
        }

        Ok(EnrichmentOutcome { risks, unavailable })
    }
}

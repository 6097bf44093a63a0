//! # In-Memory Registry
//!
//! A [`Catalog`] is a self-contained snapshot of the taxonomy: risks plus
//! the controls that mitigate them. It can be loaded from a JSON or YAML
//! file, or built from the seed taxonomy shipped with the crate.
//!
//! [`InMemoryRegistry`] serves a catalog through the [`RiskRegistry`] trait.
//! Keyword matching is a case-insensitive substring test against the risk's
//! keywords, title and description, and results keep catalog order so the
//! registry-native position is stable.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use riskgate_core::{Control, ControlId, Keyword, RiskId, RiskRecord};

use crate::error::{CatalogError, RegistryError};
use crate::{RegistryHealth, RiskRegistry};

/// Risks and controls, validated for internal consistency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub risks: Vec<RiskRecord>,
    #[serde(default)]
    pub controls: Vec<Control>,
}

impl Catalog {
    /// Load a catalog file. `.yaml`/`.yml` files are parsed as YAML,
    /// everything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            _ => Self::from_json_str(&raw),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_yaml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reject duplicate identifiers and controls that point at unknown risks.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut risk_ids = HashSet::new();
        for risk in &self.risks {
            if !risk_ids.insert(&risk.id) {
                return Err(CatalogError::DuplicateRisk(risk.id.to_string()));
            }
        }
        let mut control_ids = HashSet::new();
        for control in &self.controls {
            if !control_ids.insert(&control.id) {
                return Err(CatalogError::DuplicateControl(control.id.to_string()));
            }
            if let Some(unknown) = control.risk_ids.iter().find(|r| !risk_ids.contains(r)) {
                return Err(CatalogError::UnknownRisk {
                    control: control.id.to_string(),
                    risk: unknown.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn risk(&self, id: &RiskId) -> Option<&RiskRecord> {
        self.risks.iter().find(|r| &r.id == id)
    }

    /// Risks matching `needle`, in catalog order.
    pub fn search(&self, needle: &str) -> Vec<&RiskRecord> {
        self.risks
            .iter()
            .filter(|r| risk_matches(r, needle))
            .collect()
    }

    /// Controls mitigating `risk_id`, in catalog order.
    pub fn controls_for(&self, risk_id: &RiskId) -> Vec<&Control> {
        self.controls
            .iter()
            .filter(|c| c.risk_ids.contains(risk_id))
            .collect()
    }

    /// The seed AI/ML taxonomy used when no catalog file is configured.
    pub fn builtin() -> Self {
        let risks = SEED_RISKS
            .iter()
            .filter_map(|(id, title, description, keywords)| {
                Some(RiskRecord {
                    id: RiskId::new(*id).ok()?,
                    title: (*title).to_string(),
                    description: (*description).to_string(),
                    keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
                })
            })
            .collect();
        let controls = SEED_CONTROLS
            .iter()
            .filter_map(|(id, title, description, risks)| {
                Some(Control {
                    id: ControlId::new(*id).ok()?,
                    title: (*title).to_string(),
                    description: Some((*description).to_string()),
                    risk_ids: risks.iter().filter_map(|r| RiskId::new(*r).ok()).collect(),
                })
            })
            .collect();
        Self { risks, controls }
    }
}

/// Case-insensitive match of `needle` against a risk's keywords, title and
/// description. An empty needle matches nothing.
pub fn risk_matches(record: &RiskRecord, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    record
        .keywords
        .iter()
        .any(|k| k.to_lowercase().contains(&needle))
        || record.title.to_lowercase().contains(&needle)
        || record.description.to_lowercase().contains(&needle)
}

// ── Registry ─────────────────────────────────────────────────────────

/// [`RiskRegistry`] backed by a catalog held in memory.
#[derive(Debug, Clone)]
pub struct InMemoryRegistry {
    catalog: Arc<Catalog>,
}

impl InMemoryRegistry {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    pub fn builtin() -> Self {
        Self::new(Catalog::builtin())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[async_trait]
impl RiskRegistry for InMemoryRegistry {
    async fn find_risks_by_keyword(
        &self,
        keyword: &Keyword,
    ) -> Result<Vec<RiskRecord>, RegistryError> {
        Ok(self
            .catalog
            .search(keyword.as_str())
            .into_iter()
            .cloned()
            .collect())
    }

    async fn get_controls(&self, risk_id: &RiskId) -> Result<Vec<Control>, RegistryError> {
        Ok(self
            .catalog
            .controls_for(risk_id)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> RegistryHealth {
        RegistryHealth::Healthy
    }

    fn name(&self) -> &str {
        "InMemoryRegistry"
    }
}

// ── Seed taxonomy ────────────────────────────────────────────────────

type SeedRisk = (&'static str, &'static str, &'static str, &'static [&'static str]);
type SeedControl = (&'static str, &'static str, &'static str, &'static [&'static str]);

const SEED_RISKS: &[SeedRisk] = &[
    (
        "R.AIR.001",
        "Data poisoning (targeted)",
        "An attacker manipulates a subset of training data so the model misbehaves on chosen inputs.",
        &["data", "training", "poisoning", "integrity", "security"],
    ),
    (
        "R.AIR.002",
        "Data poisoning (backdoor)",
        "Hidden triggers planted in training data cause attacker-chosen outputs at inference time.",
        &["data", "training", "backdoor", "poisoning", "supply chain"],
    ),
    (
        "R.AIR.003",
        "Data poisoning (indiscriminate)",
        "Corrupted or low-quality training data degrades overall model accuracy.",
        &["data", "quality", "poisoning", "training"],
    ),
    (
        "R.AIR.004",
        "Training data privacy leakage",
        "The model memorises and reveals personal or confidential records from its training data.",
        &["privacy", "personal data", "pii", "memorization", "data", "gdpr"],
    ),
    (
        "R.AIR.005",
        "Discriminatory or biased outcomes",
        "Model decisions systematically disadvantage protected groups.",
        &["bias", "fairness", "discrimination", "demographic", "ethics"],
    ),
    (
        "R.AIR.006",
        "Hallucinated or fabricated output",
        "Generative models state false information with unwarranted confidence.",
        &["hallucination", "chatbot", "llm", "generative", "accuracy"],
    ),
    (
        "R.AIR.007",
        "Prompt injection",
        "Crafted inputs override system instructions of an LLM-based application.",
        &["prompt injection", "llm", "chatbot", "agent", "security"],
    ),
    (
        "R.AIR.008",
        "Model theft and extraction",
        "Adversaries reconstruct model weights or behaviour through repeated queries or exfiltration.",
        &["model", "extraction", "intellectual property", "api", "security"],
    ),
    (
        "R.AIR.009",
        "Adversarial evasion",
        "Small input perturbations cause misclassification at inference time.",
        &["adversarial", "evasion", "robustness", "computer vision", "model"],
    ),
    (
        "R.AIR.010",
        "Third-party model supply chain compromise",
        "Pre-trained models, datasets or libraries from external sources carry malicious or vulnerable components.",
        &["supply chain", "pretrained", "open source", "dependency", "model"],
    ),
    (
        "R.AIR.011",
        "Model drift in production",
        "Model performance decays as production data diverges from training data.",
        &["drift", "monitoring", "deployment", "production", "model"],
    ),
    (
        "R.AIR.012",
        "Insufficient governance and accountability",
        "No clear ownership, documentation or oversight for model decisions.",
        &["governance", "accountability", "oversight", "documentation", "compliance"],
    ),
    (
        "R.AIR.013",
        "Lack of explainability",
        "Stakeholders cannot understand or contest model decisions.",
        &["explainability", "transparency", "interpretability", "healthcare", "finance"],
    ),
    (
        "R.AIR.014",
        "Unsafe autonomous actions",
        "Agents or automated systems take irreversible actions without human review.",
        &["autonomous", "agent", "automation", "human oversight", "safety"],
    ),
];

const SEED_CONTROLS: &[SeedControl] = &[
    (
        "C.AIIM.1",
        "Maintain ML-Asset Inventory",
        "Keep an inventory of datasets, models and pipelines with owners.",
        &["R.AIR.001", "R.AIR.002", "R.AIR.010", "R.AIR.012"],
    ),
    (
        "C.AIIM.2",
        "Automated Discovery",
        "Continuously discover unmanaged ML assets and data flows.",
        &["R.AIR.010", "R.AIR.012"],
    ),
    (
        "C.AIIM.3",
        "Track Version & Lineage",
        "Record dataset and model versions and their provenance.",
        &["R.AIR.001", "R.AIR.002", "R.AIR.003", "R.AIR.011"],
    ),
    (
        "C.DATA.1",
        "Training Data Validation",
        "Validate, deduplicate and anomaly-check training data before use.",
        &["R.AIR.001", "R.AIR.002", "R.AIR.003"],
    ),
    (
        "C.PRIV.1",
        "Data Minimisation and Anonymisation",
        "Remove or pseudonymise personal data before training.",
        &["R.AIR.004"],
    ),
    (
        "C.PRIV.2",
        "Differential Privacy Training",
        "Bound the influence of any single record on model parameters.",
        &["R.AIR.004"],
    ),
    (
        "C.FAIR.1",
        "Bias Testing Across Groups",
        "Measure outcome disparities across protected attributes before release.",
        &["R.AIR.005"],
    ),
    (
        "C.OUT.1",
        "Grounding and Output Verification",
        "Ground generative outputs in trusted sources and flag unsupported claims.",
        &["R.AIR.006"],
    ),
    (
        "C.OUT.2",
        "Input and Output Filtering",
        "Filter user input and model output for injection patterns and policy violations.",
        &["R.AIR.006", "R.AIR.007"],
    ),
    (
        "C.SEC.1",
        "API Rate Limiting and Access Control",
        "Authenticate and rate-limit model endpoints.",
        &["R.AIR.007", "R.AIR.008"],
    ),
    (
        "C.SEC.2",
        "Adversarial Robustness Testing",
        "Red-team models with adversarial examples before deployment.",
        &["R.AIR.008", "R.AIR.009"],
    ),
    (
        "C.SUP.1",
        "Third-Party Model Vetting",
        "Scan and verify external models, datasets and libraries.",
        &["R.AIR.010"],
    ),
    (
        "C.MON.1",
        "Production Performance Monitoring",
        "Monitor accuracy and input distribution; alert on drift.",
        &["R.AIR.011"],
    ),
    (
        "C.GOV.1",
        "Model Risk Ownership",
        "Assign accountable owners and document intended use.",
        &["R.AIR.012", "R.AIR.013"],
    ),
    (
        "C.GOV.2",
        "Explanations for Affected Users",
        "Provide explanations and a route to contest automated decisions.",
        &["R.AIR.013"],
    ),
    (
        "C.HUM.1",
        "Human-in-the-Loop Approval",
        "Require human approval for high-impact or irreversible actions.",
        &["R.AIR.014", "R.AIR.006"],
    ),
];

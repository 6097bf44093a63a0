//! # riskgate-cli: Command-Line Front End
//!
//! Provides the `riskgate` binary. Handlers load proposals from disk or the
//! command line, hand them to [`PipelineOrchestrator`], and print the
//! outcome. No assessment logic lives here.
//!
//! ## Subcommands
//!
//! - `riskgate assess`: Assess one proposal (file or inline text).
//! - `riskgate health`: Probe the model endpoint and the registry.
//! - `riskgate batch`: Assess every proposal file in a directory.
//! - `riskgate samples`: Write the sample proposals used by `batch`.
//!
//! ```bash
//! riskgate samples
//! riskgate assess --proposal-file sample_proposals/medium_proposal.json
//! riskgate assess --proposal-text "We want to build a chatbot" --top-n 5
//! riskgate --catalog catalog.yaml batch --verbose
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Assessment completed / all dependencies healthy |
//! | 2 | Assessment degraded |
//! | 1 | Assessment failed, unhealthy dependency, or usage error |

pub mod assess;
pub mod batch;
pub mod health;
pub mod samples;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use riskgate_core::{AssessmentOutcome, ProposalDocument};
use riskgate_llm::{GeminiClient, GeminiConfig, LlmClient};
use riskgate_pipeline::{PipelineConfig, PipelineOrchestrator};
use riskgate_registry::{
    Catalog, HttpRegistryClient, InMemoryRegistry, RegistryConfig, RiskRegistry,
};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_DEGRADED: u8 = 2;

/// Default directory for sample proposals.
pub const DEFAULT_SAMPLES_DIR: &str = "sample_proposals";

/// Exit code for one assessment outcome.
pub fn exit_code(outcome: &AssessmentOutcome) -> u8 {
    match outcome {
        Ok(result) if result.is_degraded() => EXIT_DEGRADED,
        Ok(_) => EXIT_OK,
        Err(_) => EXIT_FAILURE,
    }
}

/// Global options shared by every subcommand that talks to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// YAML pipeline configuration. `RISKGATE_*` env vars apply on top.
    pub config: Option<PathBuf>,
    /// Local catalog file served by an [`InMemoryRegistry`].
    pub catalog: Option<PathBuf>,
}

/// Load the pipeline configuration from `path`, or from the environment
/// alone when no file is given.
pub fn load_pipeline_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => {
            let mut config = PipelineConfig::from_yaml_path(path)
                .with_context(|| format!("loading pipeline config {}", path.display()))?;
            config.apply_env()?;
            config.validate()?;
            Ok(config)
        }
        None => Ok(PipelineConfig::from_env()?),
    }
}

/// Select the registry backend: the local catalog when one is given,
/// otherwise the registry REST API configured from the environment.
pub fn build_registry(catalog: Option<&Path>) -> anyhow::Result<Arc<dyn RiskRegistry>> {
    match catalog {
        Some(path) => {
            let catalog = Catalog::from_path(path)
                .with_context(|| format!("loading catalog {}", path.display()))?;
            tracing::debug!(risks = catalog.risks.len(), "using local catalog");
            Ok(Arc::new(InMemoryRegistry::new(catalog)))
        }
        None => {
            let config = RegistryConfig::from_env().context("registry configuration")?;
            Ok(Arc::new(
                HttpRegistryClient::new(config).context("registry client")?,
            ))
        }
    }
}

/// Wire the Gemini client, the selected registry and the pipeline config.
pub fn build_orchestrator(options: &RuntimeOptions) -> anyhow::Result<PipelineOrchestrator> {
    let config = load_pipeline_config(options.config.as_deref())?;
    let llm: Arc<dyn LlmClient> = Arc::new(
        GeminiClient::new(
            GeminiConfig::from_env().context("GEMINI_API_KEY must be set to call the model")?,
        )
        .context("model client")?,
    );
    let registry = build_registry(options.catalog.as_deref())?;
    Ok(PipelineOrchestrator::new(llm, registry, config)?)
}

/// Read a proposal JSON file.
pub fn load_proposal_file(path: &Path) -> anyhow::Result<ProposalDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading proposal {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid proposal JSON in {}", path.display()))
}

/// Wrap inline text the way a file proposal with only a description would
/// look.
pub fn proposal_from_text(text: &str) -> ProposalDocument {
    ProposalDocument {
        proposal_title: Some("CLI Input Proposal".to_string()),
        description: text.to_string(),
        ..ProposalDocument::default()
    }
}

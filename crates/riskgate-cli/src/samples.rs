//! # Samples: write the bundled sample proposals.
//!
//! Three proposals of increasing maturity, used by `riskgate batch` as a
//! smoke test against a live model and registry.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use riskgate_core::ProposalDocument;

use crate::{DEFAULT_SAMPLES_DIR, EXIT_OK};

/// Samples subcommand arguments.
#[derive(Args, Debug)]
pub struct SamplesArgs {
    /// Directory to write the sample proposals into (created if missing).
    #[arg(long, default_value = DEFAULT_SAMPLES_DIR)]
    pub dir: PathBuf,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// The bundled sample proposals, keyed by file name.
pub fn sample_proposals() -> Vec<(&'static str, ProposalDocument)> {
    vec![
        (
            "weak_proposal.json",
            ProposalDocument {
                cfp_id: Some("CFP-003".into()),
                proposal_title: Some("AI for Everything".into()),
                description: "We want to use AI to improve our business operations.".into(),
                technical_approach: Some("We'll use machine learning models.".into()),
                ..ProposalDocument::default()
            },
        ),
        (
            "medium_proposal.json",
            ProposalDocument {
                cfp_id: Some("CFP-002".into()),
                proposal_title: Some("Customer Support Chatbot".into()),
                description: "Deploy an AI chatbot using RAG to answer customer questions \
                              based on our documentation."
                    .into(),
                technical_approach: Some(
                    "Fine-tune GPT-4 on our support tickets, use vector database for retrieval."
                        .into(),
                ),
                data_sources: strings(&["customer_tickets", "product_docs"]),
                deployment: Some("Cloud-hosted API".into()),
                ..ProposalDocument::default()
            },
        ),
        (
            "strong_proposal.json",
            ProposalDocument {
                cfp_id: Some("CFP-001".into()),
                proposal_title: Some("Secure AI-Powered Fraud Detection System".into()),
                description: "Build a real-time fraud detection system using ensemble ML \
                              models with explainability."
                    .into(),
                technical_approach: Some(
                    "Ensemble of XGBoost and neural networks, SHAP for explainability, \
                     A/B testing framework."
                        .into(),
                ),
                data_sources: strings(&[
                    "transaction_history",
                    "user_behavior",
                    "third_party_risk_scores",
                ]),
                data_governance: Some(
                    "PII anonymization, data retention policies, audit logging".into(),
                ),
                model_governance: Some(
                    "Model versioning, performance monitoring, bias testing".into(),
                ),
                deployment: Some("Kubernetes cluster with canary deployments".into()),
                security_measures: Some(
                    "Input validation, rate limiting, encrypted data at rest and in transit"
                        .into(),
                ),
                ..ProposalDocument::default()
            },
        ),
    ]
}

/// Write every sample proposal into `dir`, overwriting existing files.
pub fn write_samples(dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating sample directory {}", dir.display()))?;

    let mut written = Vec::new();
    for (name, document) in sample_proposals() {
        let path = dir.join(name);
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing sample proposal {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Execute the samples subcommand.
pub fn run_samples(args: &SamplesArgs) -> Result<u8> {
    let written = write_samples(&args.dir)?;
    for path in &written {
        println!("Created: {}", path.display());
    }
    println!();
    println!(
        "Created {} sample proposals in {}",
        written.len(),
        args.dir.display()
    );
    println!("Run 'riskgate batch --dir {}' to assess them", args.dir.display());
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_have_distinct_names_and_descriptions() {
        let samples = sample_proposals();
        assert_eq!(samples.len(), 3);
        for (name, doc) in &samples {
            assert!(name.ends_with(".json"));
            assert!(!doc.description.trim().is_empty());
            assert!(doc.cfp_id.is_some());
        }
    }

    #[test]
    fn strong_sample_renders_every_section() {
        let (_, strong) = sample_proposals()
            .into_iter()
            .find(|(name, _)| *name == "strong_proposal.json")
            .unwrap();
        let text = strong.to_text();
        for label in [
            "Title:",
            "Description:",
            "Technical Approach:",
            "Data Sources:",
            "Deployment:",
            "Data Governance:",
            "Model Governance:",
            "Security Measures:",
        ] {
            assert!(text.contains(label), "missing {label}");
        }
    }
}

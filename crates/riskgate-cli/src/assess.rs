//! # Assess: one proposal, printed as text or JSON.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args, ValueEnum};

use riskgate_core::{AssessmentResult, AssessmentStatus, Caveat, EnrichmentStatus};
use riskgate_pipeline::PipelineOrchestrator;

use crate::{exit_code, load_proposal_file, proposal_from_text};

/// Output rendering for `assess`.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Assess subcommand arguments.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["proposal_file", "proposal_text"])))]
pub struct AssessArgs {
    /// Path to a proposal JSON file.
    #[arg(long)]
    pub proposal_file: Option<PathBuf>,

    /// Proposal text given inline.
    #[arg(long)]
    pub proposal_text: Option<String>,

    /// Number of risks to return (1-10). Defaults to the pipeline setting.
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,
}

/// Execute the assess subcommand.
pub async fn run_assess(args: &AssessArgs, orchestrator: &PipelineOrchestrator) -> Result<u8> {
    let document = match (&args.proposal_file, &args.proposal_text) {
        (Some(path), _) => load_proposal_file(path)?,
        (None, Some(text)) => proposal_from_text(text),
        (None, None) => anyhow::bail!("either --proposal-file or --proposal-text is required"),
    };

    let outcome = orchestrator
        .assess(document.into_proposal(), args.top_n)
        .await;
    let code = exit_code(&outcome);

    match (&outcome, args.output_format) {
        (Ok(result), OutputFormat::Json) => println!("{}", serde_json::to_string_pretty(result)?),
        (Ok(result), OutputFormat::Text) => print!("{}", render_result(result)),
        (Err(failure), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(failure)?)
        }
        (Err(failure), OutputFormat::Text) => {
            eprintln!(
                "Assessment {} failed at stage {}: {}",
                failure.assessment_id, failure.stage, failure.reason
            );
            eprintln!("  {}", failure.detail);
        }
    }

    Ok(code)
}

const RULE: &str =
    "================================================================================";

/// Human-readable report for one result.
pub fn render_result(result: &AssessmentResult) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, result);
    out
}

fn write_report(out: &mut String, result: &AssessmentResult) -> std::fmt::Result {
    writeln!(out, "{RULE}")?;
    writeln!(out, "RISK ASSESSMENT RESULT")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "Assessment ID: {}", result.assessment_id)?;
    writeln!(out, "Timestamp: {}", result.created_at.to_rfc3339())?;
    match &result.status {
        AssessmentStatus::Completed => writeln!(out, "Status: completed")?,
        AssessmentStatus::Degraded { reason } => writeln!(out, "Status: DEGRADED ({reason})")?,
    }
    let keywords: Vec<&str> = result.keywords.iter().map(|k| k.as_str()).collect();
    writeln!(out, "Keywords: {}", keywords.join(", "))?;
    writeln!(
        out,
        "Risks Identified: {} of {} requested",
        result.risks.len(),
        result.requested_top_n
    )?;

    for risk in &result.risks {
        writeln!(out)?;
        writeln!(out, "{}. RISK: {}", risk.rank, risk.title)?;
        writeln!(out, "   ID: {}", risk.risk_id)?;
        if !risk.description.is_empty() {
            writeln!(out, "   Description: {}", risk.description)?;
        }
        if !risk.rationale.is_empty() {
            writeln!(out, "   Explanation: {}", risk.rationale)?;
        }
        match (risk.enrichment, risk.controls.is_empty()) {
            (EnrichmentStatus::Unavailable, _) => {
                writeln!(out, "   Controls: unavailable (registry error)")?
            }
            (EnrichmentStatus::Enriched, true) => writeln!(out, "   Controls: None identified")?,
            (EnrichmentStatus::Enriched, false) => {
                writeln!(out, "   Controls ({}):", risk.controls.len())?;
                for control in &risk.controls {
                    writeln!(out, "     - {}: {}", control.id, control.title)?;
                }
            }
        }
    }

    if !result.caveats.is_empty() {
        writeln!(out)?;
        writeln!(out, "Caveats:")?;
        for caveat in &result.caveats {
            writeln!(out, "  - {}", describe_caveat(caveat))?;
        }
    }
    writeln!(out)?;
    writeln!(out, "{RULE}")
}

fn describe_caveat(caveat: &Caveat) -> String {
    match caveat {
        Caveat::FewerThanRequested {
            requested,
            returned,
        } => format!("returned {returned} of {requested} requested risks"),
        Caveat::ValidationRejections { rejected, total } => {
            format!("{rejected} of {total} ranked entries rejected by validation")
        }
        Caveat::PartiallyEnriched { risk_ids } => {
            let ids: Vec<&str> = risk_ids.iter().map(|id| id.as_str()).collect();
            format!("controls unavailable for {}", ids.join(", "))
        }
        Caveat::FallbackKeywords { keywords } => {
            let words: Vec<&str> = keywords.iter().map(|k| k.as_str()).collect();
            format!("fallback keywords used: {}", words.join(", "))
        }
        Caveat::NoCandidates => "no registry risks matched the proposal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use riskgate_core::{AssessedRisk, Control, ControlId, Keyword, RiskId};
    use uuid::Uuid;

    fn sample_result() -> AssessmentResult {
        AssessmentResult {
            assessment_id: Uuid::nil(),
            created_at: Utc::now(),
            status: AssessmentStatus::Completed,
            requested_top_n: 3,
            keywords: vec![Keyword::new("chatbot").unwrap()],
            risks: vec![
                AssessedRisk {
                    rank: 1,
                    risk_id: RiskId::new("R.AIR.007").unwrap(),
                    title: "Prompt injection".into(),
                    description: "Crafted input overrides instructions.".into(),
                    rationale: "User text reaches the model.".into(),
                    controls: vec![Control {
                        id: ControlId::new("C.AIIM.1").unwrap(),
                        title: "Input filtering".into(),
                        description: None,
                        risk_ids: vec![],
                    }],
                    enrichment: EnrichmentStatus::Enriched,
                },
                AssessedRisk {
                    rank: 2,
                    risk_id: RiskId::new("R.AIR.006").unwrap(),
                    title: "Hallucination".into(),
                    description: String::new(),
                    rationale: String::new(),
                    controls: vec![],
                    enrichment: EnrichmentStatus::Unavailable,
                },
            ],
            caveats: vec![
                Caveat::FewerThanRequested {
                    requested: 3,
                    returned: 2,
                },
                Caveat::PartiallyEnriched {
                    risk_ids: vec![RiskId::new("R.AIR.006").unwrap()],
                },
            ],
        }
    }

    #[test]
    fn report_lists_risks_controls_and_caveats() {
        let text = render_result(&sample_result());
        assert!(text.contains("RISK ASSESSMENT RESULT"));
        assert!(text.contains("Status: completed"));
        assert!(text.contains("Keywords: chatbot"));
        assert!(text.contains("Risks Identified: 2 of 3 requested"));
        assert!(text.contains("1. RISK: Prompt injection"));
        assert!(text.contains("     - C.AIIM.1: Input filtering"));
        assert!(text.contains("2. RISK: Hallucination"));
        assert!(text.contains("Controls: unavailable (registry error)"));
        assert!(text.contains("returned 2 of 3 requested risks"));
        assert!(text.contains("controls unavailable for R.AIR.006"));
    }

    #[test]
    fn degraded_status_shows_reason() {
        let mut result = sample_result();
        result.status = AssessmentStatus::Degraded {
            reason: "fallback keywords were used".into(),
        };
        assert!(render_result(&result).contains("Status: DEGRADED (fallback keywords were used)"));
    }
}

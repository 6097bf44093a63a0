//! End-to-end tests for the CLI handlers: sample files on disk, a catalog
//! file served in memory, and a scripted model client.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use riskgate_cli::assess::{run_assess, AssessArgs, OutputFormat};
use riskgate_cli::batch::{assess_directory, batch_exit_code, run_batch, BatchArgs};
use riskgate_cli::health::check_health;
use riskgate_cli::samples::write_samples;
use riskgate_cli::{build_registry, proposal_from_text, EXIT_DEGRADED, EXIT_FAILURE, EXIT_OK};
use riskgate_core::{FailureReason, Stage};
use riskgate_llm::{
    KeywordPayload, KeywordRequest, LlmClient, LlmError, RankingPayload, RankingRequest,
    RawRankedRisk,
};
use riskgate_pipeline::{PipelineConfig, PipelineOrchestrator};
use riskgate_registry::Catalog;

struct ScriptedLlm {
    ranked_ids: Vec<&'static str>,
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn extract_keywords(&self, _: &KeywordRequest) -> Result<KeywordPayload, LlmError> {
        Ok(KeywordPayload {
            keywords: vec!["chatbot".into()],
            confidence: None,
        })
    }

    async fn rank_risks(&self, _: &RankingRequest) -> Result<RankingPayload, LlmError> {
        Ok(RankingPayload {
            risks: self
                .ranked_ids
                .iter()
                .enumerate()
                .map(|(i, id)| RawRankedRisk {
                    risk_id: (*id).to_string(),
                    rank: Some(i as u32 + 1),
                    rationale: Some("applies to conversational assistants".into()),
                })
                .collect(),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn write_catalog(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("catalog.json");
    let json = serde_json::to_string(&Catalog::builtin()).unwrap();
    std::fs::write(&path, json).unwrap();
    path
}

fn orchestrator(dir: &Path, ranked_ids: Vec<&'static str>) -> PipelineOrchestrator {
    let registry = build_registry(Some(&write_catalog(dir))).unwrap();
    let config = PipelineConfig {
        retry_base_delay_ms: 1,
        ..PipelineConfig::default()
    };
    PipelineOrchestrator::new(Arc::new(ScriptedLlm { ranked_ids }), registry, config).unwrap()
}

#[tokio::test]
async fn batch_over_written_samples_completes() {
    let dir = tempfile::tempdir().unwrap();
    let samples = dir.path().join("sample_proposals");
    let written = write_samples(&samples).unwrap();
    assert_eq!(written.len(), 3);

    let orch = orchestrator(dir.path(), vec!["R.AIR.007", "R.AIR.006"]);
    let entries = assess_directory(&samples, &orch, false).await.unwrap();

    let files: Vec<_> = entries.iter().map(|e| e.file.as_str()).collect();
    assert_eq!(
        files,
        vec!["medium_proposal.json", "strong_proposal.json", "weak_proposal.json"]
    );
    for entry in &entries {
        assert_eq!(entry.outcome, "completed");
        assert_eq!(entry.risk_ids, vec!["R.AIR.007", "R.AIR.006"]);
    }
    assert_eq!(batch_exit_code(&entries), EXIT_OK);
}

#[tokio::test]
async fn batch_reports_unreadable_file_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let samples = dir.path().join("proposals");
    write_samples(&samples).unwrap();
    std::fs::write(samples.join("broken.json"), "{ \"title\": ").unwrap();

    let orch = orchestrator(dir.path(), vec!["R.AIR.007"]);
    let code = run_batch(
        &BatchArgs {
            dir: samples,
            verbose: true,
        },
        &orch,
    )
    .await
    .unwrap();
    assert_eq!(code, EXIT_FAILURE);
}

#[tokio::test]
async fn empty_batch_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec!["R.AIR.007"]);
    let empty = dir.path().join("empty");
    std::fs::create_dir(&empty).unwrap();
    let err = assess_directory(&empty, &orch, false).await.unwrap_err();
    assert!(err.to_string().contains("no proposal files found"));
}

#[tokio::test]
async fn assess_file_as_json_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let written = write_samples(dir.path()).unwrap();
    let orch = orchestrator(dir.path(), vec!["R.AIR.007", "R.AIR.006"]);

    let args = AssessArgs {
        proposal_file: Some(written[1].clone()),
        proposal_text: None,
        top_n: Some(2),
        output_format: OutputFormat::Json,
    };
    assert_eq!(run_assess(&args, &orch).await.unwrap(), EXIT_OK);
}

#[tokio::test]
async fn hallucinated_ranking_exits_degraded() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec!["R.AIR.999", "R.ZZZ.1"]);

    let args = AssessArgs {
        proposal_file: None,
        proposal_text: Some("Customer support chatbot answering billing questions".into()),
        top_n: None,
        output_format: OutputFormat::Text,
    };
    assert_eq!(run_assess(&args, &orch).await.unwrap(), EXIT_DEGRADED);
}

#[tokio::test]
async fn out_of_range_top_n_exits_failure() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec!["R.AIR.007"]);

    let args = AssessArgs {
        proposal_file: None,
        proposal_text: Some("chatbot".into()),
        top_n: Some(11),
        output_format: OutputFormat::Text,
    };
    assert_eq!(run_assess(&args, &orch).await.unwrap(), EXIT_FAILURE);
}

#[tokio::test]
async fn blank_inline_text_fails_at_normalize() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec!["R.AIR.007"]);

    let failure = orch
        .assess(proposal_from_text("   \n\t ").into_proposal(), None)
        .await
        .unwrap_err();
    assert_eq!(failure.stage, Stage::Normalize);
    assert_eq!(failure.reason, FailureReason::InvalidInput);

    let args = AssessArgs {
        proposal_file: None,
        proposal_text: Some("   ".into()),
        top_n: None,
        output_format: OutputFormat::Json,
    };
    assert_eq!(run_assess(&args, &orch).await.unwrap(), EXIT_FAILURE);
}

#[tokio::test]
async fn missing_proposal_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec!["R.AIR.007"]);

    let args = AssessArgs {
        proposal_file: Some(dir.path().join("absent.json")),
        proposal_text: None,
        top_n: None,
        output_format: OutputFormat::Text,
    };
    assert!(run_assess(&args, &orch).await.is_err());
}

#[tokio::test]
async fn health_reports_both_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(dir.path(), vec![]);
    let report = check_health(&orch).await;
    assert!(report.all_healthy());
    assert_eq!(report.model, "scripted");
    assert_eq!(report.registry, "InMemoryRegistry");
}

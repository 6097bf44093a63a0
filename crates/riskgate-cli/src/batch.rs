//! # Batch: assess every proposal file in a directory.
//!
//! Files are processed in file-name order, one at a time. A failed or
//! unreadable proposal is reported and the batch continues; the exit code
//! is the worst per-file code (failure over degraded over completed).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use riskgate_core::AssessmentOutcome;
use riskgate_pipeline::PipelineOrchestrator;

use crate::assess::render_result;
use crate::{exit_code, load_proposal_file, DEFAULT_SAMPLES_DIR, EXIT_DEGRADED, EXIT_FAILURE, EXIT_OK};

/// Batch subcommand arguments.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory of proposal JSON files.
    #[arg(long, default_value = DEFAULT_SAMPLES_DIR)]
    pub dir: PathBuf,

    /// Print the full report for every proposal.
    #[arg(long)]
    pub verbose: bool,
}

/// Per-file summary line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    pub file: String,
    pub outcome: String,
    pub risk_ids: Vec<String>,
    pub exit_code: u8,
}

/// `*.json` files in `dir`, sorted by name.
pub fn proposal_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("proposal directory not found: {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn summarize(file: String, outcome: &AssessmentOutcome) -> BatchEntry {
    match outcome {
        Ok(result) => BatchEntry {
            file,
            outcome: if result.is_degraded() {
                "degraded".to_string()
            } else {
                "completed".to_string()
            },
            risk_ids: result.risk_ids().map(|id| id.to_string()).collect(),
            exit_code: exit_code(outcome),
        },
        Err(failure) => BatchEntry {
            file,
            outcome: format!("failed at {}: {}", failure.stage, failure.reason),
            risk_ids: Vec::new(),
            exit_code: EXIT_FAILURE,
        },
    }
}

/// Worst exit code across entries.
pub fn batch_exit_code(entries: &[BatchEntry]) -> u8 {
    if entries.iter().any(|e| e.exit_code == EXIT_FAILURE) {
        EXIT_FAILURE
    } else if entries.iter().any(|e| e.exit_code == EXIT_DEGRADED) {
        EXIT_DEGRADED
    } else {
        EXIT_OK
    }
}

/// Assess every proposal file and collect one entry per file.
pub async fn assess_directory(
    dir: &Path,
    orchestrator: &PipelineOrchestrator,
    verbose: bool,
) -> Result<Vec<BatchEntry>> {
    let files = proposal_files(dir)?;
    if files.is_empty() {
        anyhow::bail!(
            "no proposal files found in {}; run 'riskgate samples' first",
            dir.display()
        );
    }

    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("Assessing: {name}");

        let document = match load_proposal_file(&path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(file = %name, "{e:#}");
                entries.push(BatchEntry {
                    file: name,
                    outcome: "unreadable".to_string(),
                    risk_ids: Vec::new(),
                    exit_code: EXIT_FAILURE,
                });
                continue;
            }
        };

        let outcome = orchestrator.assess(document.into_proposal(), None).await;
        if verbose {
            if let Ok(result) = &outcome {
                print!("{}", render_result(result));
            }
        }
        entries.push(summarize(name, &outcome));
    }
    Ok(entries)
}

/// Summary table printed after a batch.
pub fn render_summary(entries: &[BatchEntry]) -> String {
    let rule = "=".repeat(60);
    let mut lines = vec![rule.clone(), "BATCH SUMMARY".to_string(), rule];
    for e in entries {
        lines.push(format!(
            "{}: {} - {} risks [{}]",
            e.file,
            e.outcome,
            e.risk_ids.len(),
            e.risk_ids.join(", ")
        ));
    }
    lines.push(String::new());
    lines.push(format!("Total proposals: {}", entries.len()));
    lines.join("\n")
}

/// Execute the batch subcommand.
pub async fn run_batch(args: &BatchArgs, orchestrator: &PipelineOrchestrator) -> Result<u8> {
    let entries = assess_directory(&args.dir, orchestrator, args.verbose).await?;
    println!("{}", render_summary(&entries));
    Ok(batch_exit_code(&entries))
}

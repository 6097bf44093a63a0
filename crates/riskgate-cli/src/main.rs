//! # riskgate CLI entry point
//!
//! Parses arguments, initialises tracing from the verbosity flag, builds a
//! tokio runtime for the commands that call the pipeline, and maps the
//! handler result to the process exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use riskgate_cli::assess::{run_assess, AssessArgs};
use riskgate_cli::batch::{run_batch, BatchArgs};
use riskgate_cli::health::run_health;
use riskgate_cli::samples::{run_samples, SamplesArgs};
use riskgate_cli::{build_orchestrator, RuntimeOptions, EXIT_FAILURE};

/// riskgate: AI/ML proposal risk assessment.
///
/// Extracts keywords from a proposal, gathers candidate risks from the
/// registry, ranks them with the model and attaches mitigating controls.
#[derive(Parser, Debug)]
#[command(name = "riskgate", version, about, long_about = None)]
struct Cli {
    /// Log verbosity. Repeat for more (-v, -vv, -vvv).
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbosity: u8,

    /// Pipeline configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Serve risks from a local catalog file instead of the registry API.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assess one proposal.
    Assess(AssessArgs),

    /// Check the model endpoint and the registry.
    Health,

    /// Assess every proposal file in a directory.
    Batch(BatchArgs),

    /// Write sample proposals to a directory.
    Samples(SamplesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let options = RuntimeOptions {
        config: cli.config,
        catalog: cli.catalog,
    };

    if let Commands::Samples(args) = &cli.command {
        return run_samples(args);
    }

    let orchestrator = build_orchestrator(&options)?;
    tracing::debug!(?orchestrator, "pipeline ready");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match &cli.command {
            Commands::Assess(args) => run_assess(args, &orchestrator).await,
            Commands::Health => run_health(&orchestrator).await,
            Commands::Batch(args) => run_batch(args, &orchestrator).await,
            Commands::Samples(args) => run_samples(args),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_assess_with_file() {
        let cli = Cli::try_parse_from([
            "riskgate",
            "assess",
            "--proposal-file",
            "p.json",
            "--top-n",
            "5",
            "--output-format",
            "json",
        ])
        .unwrap();
        let Commands::Assess(args) = cli.command else {
            panic!("expected assess");
        };
        assert_eq!(args.proposal_file, Some(PathBuf::from("p.json")));
        assert_eq!(args.top_n, Some(5));
        assert_eq!(
            args.output_format,
            riskgate_cli::assess::OutputFormat::Json
        );
    }

    #[test]
    fn assess_requires_exactly_one_input() {
        assert!(Cli::try_parse_from(["riskgate", "assess"]).is_err());
        assert!(Cli::try_parse_from([
            "riskgate",
            "assess",
            "--proposal-file",
            "p.json",
            "--proposal-text",
            "chatbot",
        ])
        .is_err());
    }

    #[test]
    fn output_format_defaults_to_text() {
        let cli =
            Cli::try_parse_from(["riskgate", "assess", "--proposal-text", "chatbot"]).unwrap();
        let Commands::Assess(args) = cli.command else {
            panic!("expected assess");
        };
        assert_eq!(
            args.output_format,
            riskgate_cli::assess::OutputFormat::Text
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "riskgate", "batch", "-vv", "--catalog", "cat.yaml", "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 2);
        assert_eq!(cli.catalog, Some(PathBuf::from("cat.yaml")));
        let Commands::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert!(args.verbose);
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn batch_and_samples_default_directory() {
        let cli = Cli::try_parse_from(["riskgate", "batch"]).unwrap();
        let Commands::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(args.dir, PathBuf::from("sample_proposals"));
        assert!(!args.verbose);

        let cli = Cli::try_parse_from(["riskgate", "samples", "--dir", "out"]).unwrap();
        let Commands::Samples(args) = cli.command else {
            panic!("expected samples");
        };
        assert_eq!(args.dir, PathBuf::from("out"));
    }

    #[test]
    fn health_takes_global_options() {
        let cli = Cli::try_parse_from(["riskgate", "--config", "p.yaml", "health"]).unwrap();
        assert!(matches!(cli.command, Commands::Health));
        assert_eq!(cli.config, Some(PathBuf::from("p.yaml")));
    }
}

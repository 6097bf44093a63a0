//! # riskgate-api: Binary Entry Point
//!
//! Wires the Gemini client, the registry client and the pipeline
//! configuration from the environment, then serves the axum app.

use std::sync::Arc;

use anyhow::Context;
use riskgate_api::state::{AppConfig, AppState};
use riskgate_llm::{GeminiClient, GeminiConfig, LlmClient};
use riskgate_pipeline::{PipelineConfig, PipelineOrchestrator};
use riskgate_registry::{
    Catalog, HttpRegistryClient, InMemoryRegistry, RegistryConfig, RiskRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();

    let pipeline_config = match std::env::var("RISKGATE_CONFIG") {
        Ok(path) => {
            let mut cfg = PipelineConfig::from_yaml_path(&path)?;
            cfg.apply_env()?;
            cfg
        }
        Err(_) => PipelineConfig::from_env()?,
    };

    let llm: Arc<dyn LlmClient> = Arc::new(
        GeminiClient::new(GeminiConfig::from_env().context("model client configuration")?)
            .context("model client")?,
    );

    let registry: Arc<dyn RiskRegistry> = match std::env::var("RISKGATE_CATALOG") {
        Ok(path) => {
            tracing::info!(catalog = %path, "serving risks from local catalog");
            Arc::new(InMemoryRegistry::new(
                Catalog::from_path(&path).context("loading catalog")?,
            ))
        }
        Err(_) => Arc::new(
            HttpRegistryClient::new(RegistryConfig::from_env().context("registry configuration")?)
                .context("registry client")?,
        ),
    };

    let orchestrator = PipelineOrchestrator::new(llm, registry, pipeline_config)?;
    tracing::info!(?orchestrator, "pipeline ready");

    let port = config.port;
    let state = AppState::new(orchestrator, config).context("metrics registry")?;
    let app = riskgate_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("riskgate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// `RUST_LOG` filter (default `info`); JSON lines when
/// `RISKGATE_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("RISKGATE_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

//! # Health: probe the model endpoint and the registry.

use anyhow::Result;

use riskgate_pipeline::PipelineOrchestrator;

use crate::{EXIT_FAILURE, EXIT_OK};

/// Result of probing both dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub model: String,
    pub llm_healthy: bool,
    pub registry: String,
    pub registry_healthy: bool,
    pub registry_detail: String,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.llm_healthy && self.registry_healthy
    }

    pub fn render(&self) -> String {
        let mark = |ok: bool| if ok { "healthy" } else { "UNHEALTHY" };
        let mut lines = vec![
            "Health Check Results:".to_string(),
            "-".repeat(40),
            format!("llm ({}): {}", self.model, mark(self.llm_healthy)),
            format!(
                "registry ({}): {}",
                self.registry,
                mark(self.registry_healthy)
            ),
        ];
        if !self.registry_healthy {
            lines.push(format!("  {}", self.registry_detail));
        }
        lines.push(String::new());
        lines.push(if self.all_healthy() {
            "Overall Status: all services healthy".to_string()
        } else {
            "Overall Status: some services unhealthy".to_string()
        });
        lines.join("\n")
    }
}

/// Probe both dependencies concurrently.
pub async fn check_health(orchestrator: &PipelineOrchestrator) -> HealthReport {
    let llm = orchestrator.llm();
    let registry = orchestrator.registry();
    let (llm_healthy, registry_health) = tokio::join!(llm.health_check(), registry.health_check());

    HealthReport {
        model: llm.model_name().to_string(),
        llm_healthy,
        registry: registry.name().to_string(),
        registry_healthy: registry_health.is_healthy(),
        registry_detail: registry_health.to_string(),
    }
}

/// Execute the health subcommand.
pub async fn run_health(orchestrator: &PipelineOrchestrator) -> Result<u8> {
    let report = check_health(orchestrator).await;
    println!("{}", report.render());
    if report.all_healthy() {
        Ok(EXIT_OK)
    } else {
        tracing::warn!(?report, "dependency health check failed");
        Ok(EXIT_FAILURE)
    }
}

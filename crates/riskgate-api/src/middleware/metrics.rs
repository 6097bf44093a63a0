//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Assessment outcomes and per-stage failures are recorded by
//! the assessment handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use riskgate_core::{AssessmentOutcome, AssessmentStatus};

/// Label used for requests that matched no route.
const UNMATCHED_PATH: &str = "unmatched";

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    assessments_total: IntCounterVec,
    stage_failures_total: IntCounterVec,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a metrics instance with a fresh Prometheus registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("riskgate_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "riskgate_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
            ]),
            &["method", "path"],
        )?;
        let http_errors_total = IntCounterVec::new(
            Opts::new(
                "riskgate_http_errors_total",
                "Total HTTP errors (4xx and 5xx)",
            ),
            &["method", "path", "status"],
        )?;
        let assessments_total = IntCounterVec::new(
            Opts::new(
                "riskgate_assessments_total",
                "Assessments by outcome (completed, degraded, failed)",
            ),
            &["outcome"],
        )?;
        let stage_failures_total = IntCounterVec::new(
            Opts::new(
                "riskgate_stage_failures_total",
                "Failed assessments by stage and reason",
            ),
            &["stage", "reason"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_errors_total.clone()))?;
        registry.register(Box::new(assessments_total.clone()))?;
        registry.register(Box::new(stage_failures_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                assessments_total,
                stage_failures_total,
            }),
        })
    }

    /// Total request count across all labels.
    pub fn requests(&self) -> u64 {
        sum_counter(&self.inner.http_requests_total)
    }

    /// Total error count across all labels.
    pub fn errors(&self) -> u64 {
        sum_counter(&self.inner.http_errors_total)
    }

    /// Count of assessments recorded with `outcome`.
    pub fn assessments(&self, outcome: &str) -> u64 {
        self.inner
            .assessments_total
            .with_label_values(&[outcome])
            .get()
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Record the outcome of one assessment.
    pub fn record_assessment(&self, outcome: &AssessmentOutcome) {
        let label = match outcome {
            Ok(result) => match result.status {
                AssessmentStatus::Completed => "completed",
                AssessmentStatus::Degraded { .. } => "degraded",
            },
            Err(failure) => {
                self.inner
                    .stage_failures_total
                    .with_label_values(&[failure.stage.as_str(), failure.reason.as_str()])
                    .inc();
                "failed"
            }
        };
        self.inner.assessments_total.with_label_values(&[label]).inc();
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

fn sum_counter(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Middleware that records HTTP request metrics. Paths are labelled by
/// route template so label cardinality stays bounded.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(
            &method,
            &path,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use riskgate_core::{AssessmentFailure, FailureReason, Stage};
    use uuid::Uuid;

    #[test]
    fn starts_at_zero() {
        let m = ApiMetrics::new().unwrap();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.errors(), 0);
    }

    #[test]
    fn errors_counted_separately() {
        let m = ApiMetrics::new().unwrap();
        for _ in 0..4 {
            m.record_request("GET", "/api/health", 200, 0.01);
        }
        m.record_request("POST", "/api/v1/assess-risks", 502, 3.0);
        m.record_request("POST", "/api/v1/assess-risks", 422, 0.01);
        assert_eq!(m.requests(), 6);
        assert_eq!(m.errors(), 2);
    }

    #[test]
    fn failed_assessment_records_stage_and_reason() {
        let m = ApiMetrics::new().unwrap();
        let outcome: AssessmentOutcome = Err(AssessmentFailure {
            assessment_id: Uuid::new_v4(),
            stage: Stage::GatherCandidates,
            reason: FailureReason::RegistryUnavailable,
            detail: "registry unavailable".into(),
        });
        m.record_assessment(&outcome);

        assert_eq!(m.assessments("failed"), 1);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("riskgate_stage_failures_total"));
        assert!(text.contains("stage=\"gather_candidates\""));
        assert!(text.contains("reason=\"registry_unavailable\""));
    }

    #[test]
    fn encodes_http_metrics() {
        let m = ApiMetrics::new().unwrap();
        m.record_request("GET", "/metrics", 200, 0.001);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("riskgate_http_requests_total"));
        assert!(text.contains("riskgate_http_request_duration_seconds"));
    }
}

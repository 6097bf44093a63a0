//! Bounded retry with per-call timeout for model calls.
//!
//! Each attempt is wrapped in the configured model-call timeout; an elapsed
//! timeout counts as a transient failure. Only transient errors
//! (`Unavailable`, `Timeout`) are retried, with exponential backoff from the
//! configured base delay. `Malformed` and `Rejected` return immediately.

use std::future::Future;

use riskgate_llm::LlmError;
use uuid::Uuid;

use crate::config::PipelineConfig;

/// Call `f` up to `model_retries + 1` times.
pub(crate) async fn call_model<T, F, Fut>(
    config: &PipelineConfig,
    assessment_id: Uuid,
    operation: &'static str,
    f: F,
) -> Result<T, LlmError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt: u32 = 0;
    loop {
        let result = match tokio::time::timeout(config.model_call_timeout(), f()).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout),
        };
        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < config.model_retries => {
                let delay = config.retry_base_delay() * 2u32.saturating_pow(attempt);
                attempt += 1;
                tracing::warn!(
                    assessment_id = %assessment_id,
                    operation,
                    attempt,
                    max_retries = config.model_retries,
                    "model call failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            retry_base_delay_ms: 1,
            model_call_timeout_ms: 50,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_then_returned() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = call_model(&fast_config(), Uuid::nil(), "test", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(LlmError::Unavailable {
                    reason: "503".into(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(LlmError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_error_then_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = call_model(&fast_config(), Uuid::nil(), "test", || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(LlmError::Timeout)
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), _> = call_model(&fast_config(), Uuid::nil(), "test", || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(LlmError::malformed("not json"))
            }
        })
        .await;
        assert!(matches!(result, Err(LlmError::Malformed { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_call_times_out_per_attempt() {
        let config = PipelineConfig {
            model_retries: 0,
            ..fast_config()
        };
        let result: Result<(), _> = call_model(&config, Uuid::nil(), "test", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(LlmError::Timeout)));
    }
}

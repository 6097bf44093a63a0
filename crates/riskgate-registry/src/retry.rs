//! Bounded retry for registry requests.
//!
//! Transport failures and `429`/`5xx` responses are retried with
//! exponential backoff from the configured base delay. Any other status is
//! handed straight back for the caller to map. Once the budget is spent the
//! last response or transport error is returned unchanged.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};

/// Retry budget of one [`HttpRegistryClient`](crate::HttpRegistryClient).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`.
    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Statuses the registry uses for overload and outages.
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Call `f` up to `policy.max_retries + 1` times.
pub(crate) async fn send_with_retry<F, Fut>(
    policy: RetryPolicy,
    endpoint: &'static str,
    f: F,
) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt: u32 = 0;
    loop {
        let outcome = f().await;
        let cause = match &outcome {
            Ok(resp) if is_retryable_status(resp.status()) => {
                Some(format!("status {}", resp.status().as_u16()))
            }
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        };
        let cause = match cause {
            Some(cause) if attempt < policy.max_retries => cause,
            _ => return outcome,
        };

        let delay = policy.delay(attempt);
        attempt += 1;
        tracing::warn!(
            endpoint,
            attempt,
            max_retries = policy.max_retries,
            "registry request failed, retrying in {delay:?}: {cause}"
        );
        tokio::time::sleep(delay).await;
    }
}

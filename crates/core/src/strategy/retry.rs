//! Fetch with one bounded retry.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::metrics::FETCH_ATTEMPTS;

use super::StrategyFailure;

/// Timeouts for the first attempt and the single retry, and the pause between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub first_timeout: Duration,
    pub retry_timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            first_timeout: Duration::from_millis(config.first_timeout_ms),
            retry_timeout: Duration::from_millis(config.retry_timeout_ms),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

impl RetryPolicy {
    fn attempt_timeouts(&self) -> [Duration; 2] {
        [self.first_timeout, self.retry_timeout]
    }
}

/// GET `request.url`, retrying once on timeouts, transport errors and non-2xx statuses.
///
/// The request's own timeout is replaced by the per-attempt budget, which is
/// also enforced around the client call.
pub async fn fetch_with_retry(
    http: &dyn HttpClient,
    request: &HttpRequest,
    policy: &RetryPolicy,
) -> Result<HttpResponse, StrategyFailure> {
    let mut last_failure = StrategyFailure::Transport("no attempt made".to_string());

    for (attempt, budget) in policy.attempt_timeouts().into_iter().enumerate() {
        if attempt > 0 {
            sleep(policy.backoff).await;
        }

        let attempt_request = HttpRequest {
            timeout: budget,
            ..request.clone()
        };

        match timeout(budget, http.get(&attempt_request)).await {
            Ok(Ok(response)) if response.is_success() => {
                FETCH_ATTEMPTS.with_label_values(&["success"]).inc();
                debug!(url = %request.url, attempt = attempt + 1, status = response.status, "Fetch succeeded");
                return Ok(response);
            }
            Ok(Ok(response)) => {
                FETCH_ATTEMPTS.with_label_values(&["http_error"]).inc();
                warn!(url = %request.url, attempt = attempt + 1, status = response.status, "Fetch returned error status");
                last_failure = StrategyFailure::Transport(format!("HTTP {}", response.status));
            }
            Ok(Err(e)) => {
                let failure = StrategyFailure::from(e);
                FETCH_ATTEMPTS.with_label_values(&[failure.kind()]).inc();
                warn!(url = %request.url, attempt = attempt + 1, error = %failure, "Fetch failed");
                last_failure = failure;
            }
            Err(_) => {
                FETCH_ATTEMPTS.with_label_values(&["timeout"]).inc();
                warn!(url = %request.url, attempt = attempt + 1, budget_ms = budget.as_millis() as u64, "Fetch timed out");
                last_failure = StrategyFailure::Timeout;
            }
        }
    }

    Err(last_failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, TransportError};
    use crate::testing::MockHttpClient;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            first_timeout: Duration::from_millis(50),
            retry_timeout: Duration::from_millis(80),
            backoff: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_default_policy_matches_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.first_timeout, Duration::from_secs(5));
        assert_eq!(policy.retry_timeout, Duration::from_secs(7));
        assert_eq!(policy.backoff, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let http = MockHttpClient::new();
        http.respond("http://test/a", HttpResponse::new(200, "ok")).await;

        let request = HttpRequest::get("http://test/a", Duration::from_secs(1));
        let response = fetch_with_retry(&http, &request, &fast_policy()).await.unwrap();
        assert_eq!(response.body, "ok");
        assert_eq!(http.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_retry_after_transport_error() {
        let http = MockHttpClient::new();
        http.push_error("http://test/a", TransportError::Connect("reset".into()))
            .await;
        http.respond("http://test/a", HttpResponse::new(200, "second"))
            .await;

        let request = HttpRequest::get("http://test/a", Duration::from_secs(1));
        let response = fetch_with_retry(&http, &request, &fast_policy()).await.unwrap();
        assert_eq!(response.body, "second");

        let requests = http.recorded_requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].timeout, Duration::from_millis(50));
        assert_eq!(requests[1].timeout, Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_error_status_is_retried_then_surfaced() {
        let http = MockHttpClient::new();
        http.respond("http://test/a", HttpResponse::new(503, "busy")).await;

        let request = HttpRequest::get("http://test/a", Duration::from_secs(1));
        let err = fetch_with_retry(&http, &request, &fast_policy())
            .await
            .unwrap_err();
        assert_eq!(err, StrategyFailure::Transport("HTTP 503".to_string()));
        assert_eq!(http.request_count().await, 2);
    }

    #[tokio::test]
    async fn test_slow_responses_time_out() {
        let http = MockHttpClient::new();
        http.respond("http://test/a", HttpResponse::new(200, "late")).await;
        http.set_delay(Duration::from_millis(500)).await;

        let request = HttpRequest::get("http://test/a", Duration::from_secs(10));
        let started = std::time::Instant::now();
        let err = fetch_with_retry(&http, &request, &fast_policy())
            .await
            .unwrap_err();
        assert_eq!(err, StrategyFailure::Timeout);
        // 50ms + 10ms backoff + 80ms, well under the mock's 500ms delay.
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_unknown_url_is_transport_failure() {
        let http = MockHttpClient::new();
        let request = HttpRequest::get("http://test/missing", Duration::from_secs(1));
        let err = fetch_with_retry(&http, &request, &fast_policy())
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyFailure::Transport(_)));
    }
}

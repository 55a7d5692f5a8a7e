use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ApiError;
use crate::net::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Retry policy for the request executor.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff before retry `n` is `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1) }
    }
}

/// Wraps the transport with bounded retry and status classification.
///
/// 2xx returns immediately. 429 and 5xx are transient (rate limit, server
/// trouble) and retried with exponential backoff, as are transport-level
/// network failures. Every other status fails on the first response:
/// retrying a malformed request burns quota without changing the outcome.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    retry: RetryConfig,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_retry(transport, RetryConfig::default())
    }

    pub fn with_retry(transport: Arc<dyn HttpTransport>, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }

    pub async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut last_error = None;

        for attempt in 0..self.retry.max_attempts {
            match self.transport.send(request).await {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, url = %request.url, "request succeeded");
                    return Ok(response);
                }
                Ok(response) => {
                    let error =
                        ApiError::Http { status: response.status, body: response.text() };
                    if error.is_retryable() && attempt + 1 < self.retry.max_attempts {
                        warn!(
                            status = response.status,
                            attempt,
                            url = %request.url,
                            "transient HTTP status, backing off"
                        );
                        self.backoff(attempt).await;
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error);
                }
                Err(error @ ApiError::Network(_)) => {
                    if attempt + 1 < self.retry.max_attempts {
                        warn!(error = %error, attempt, url = %request.url, "network failure, backing off");
                        self.backoff(attempt).await;
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error.unwrap_or_else(|| ApiError::Network("max retries exceeded".into())))
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self.retry.base_delay * 2u32.pow(attempt);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::testing::{status, ScriptedTransport};

    fn request() -> HttpRequest {
        HttpRequest::post("https://remote.test/items")
    }

    #[tokio::test(start_paused = true)]
    async fn success_returns_without_retry() {
        let transport = ScriptedTransport::new(vec![status(200, "ok")]);
        let executor = RequestExecutor::new(transport.clone());

        let response = executor.execute(&request()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_retry_until_exhausted_and_keep_last_body() {
        let transport = ScriptedTransport::new(vec![
            status(500, "first"),
            status(502, "second"),
            status(503, "third"),
        ]);
        let executor = RequestExecutor::new(transport.clone());

        let err = executor.execute(&request()).await.unwrap_err();
        assert_eq!(transport.calls(), 3);
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "third");
                assert!(ApiError::Http { status, body }.is_retryable());
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_success_recovers() {
        let transport = ScriptedTransport::new(vec![status(429, "slow down"), status(200, "ok")]);
        let executor = RequestExecutor::new(transport.clone());

        let response = executor.execute(&request()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_fails_on_first_response() {
        let transport = ScriptedTransport::new(vec![status(400, "bad payload")]);
        let executor = RequestExecutor::new(transport.clone());

        let err = executor.execute(&request()).await.unwrap_err();
        assert_eq!(transport.calls(), 1);
        match err {
            ApiError::Http { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad payload");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn network_failures_retry_then_surface_last_error() {
        let transport = ScriptedTransport::new(vec![
            Err(ApiError::Network("reset 1".into())),
            Err(ApiError::Network("reset 2".into())),
            Err(ApiError::Network("reset 3".into())),
        ]);
        let executor = RequestExecutor::new(transport.clone());

        let err = executor.execute(&request()).await.unwrap_err();
        assert_eq!(transport.calls(), 3);
        match err {
            ApiError::Network(msg) => assert_eq!(msg, "reset 3"),
            other => panic!("expected Network error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn network_failure_then_success_recovers() {
        let transport = ScriptedTransport::new(vec![
            Err(ApiError::Network("reset".into())),
            status(201, "created"),
        ]);
        let executor = RequestExecutor::new(transport.clone());

        let response = executor.execute(&request()).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_network_transport_errors_do_not_retry() {
        let transport =
            ScriptedTransport::new(vec![Err(ApiError::InvalidUrl("::bad::".into()))]);
        let executor = RequestExecutor::new(transport.clone());

        let err = executor.execute(&request()).await.unwrap_err();
        assert_eq!(transport.calls(), 1);
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }
}

use thiserror::Error;

/// Errors surfaced by the sync core's network stack.
///
/// Every variant carries enough for a short human-readable message; the UI
/// displays it and leaves prior state unchanged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid response from server")]
    InvalidResponse,

    #[error("HTTP {status}: {}", snippet(.body, 100))]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse response: {0}")]
    Decoding(String),

    #[error("no data received")]
    NoData,

    #[error("empty response from server")]
    EmptyResponse,

    #[error("rate limited, try again later")]
    RateLimited,

    #[error("server error ({0}), try again later")]
    ServerError(u16),

    #[error("request was cancelled")]
    Cancelled,
}

impl ApiError {
    /// Whether the retry layer may re-issue the request that produced this
    /// error. `Http` derives retryability from the status it carries, so the
    /// error returned after retry exhaustion still holds the last observed
    /// status and body.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_) => true,
            ApiError::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

fn snippet(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

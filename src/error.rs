/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Connection-level failure from `reqwest` (DNS, TLS, socket, body read).
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// An attempt exceeded its timeout budget.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
    /// The 401-triggered token refresh itself failed.
    #[error("token refresh failed: {0}")]
    AuthRefresh(String),
    /// The caller aborted the request through its cancel token.
    #[error("request cancelled")]
    Cancelled,
    /// A request or response interceptor rejected the call.
    #[error("interceptor error: {0}")]
    Interceptor(String),
    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RelayError {
    /// Whether the retry policy may reissue the attempt.
    ///
    /// Anything that reached the network may be retried. Refresh failures,
    /// cancellations and interceptor rejections are terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Http { .. } | Self::Timeout { .. }
        )
    }
}

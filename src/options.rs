use crate::CancelToken;

/// Construction-time client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto.
    pub base_url: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Fixed delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Headers attached to every outgoing request.
    pub headers: Vec<(String, String)>,
    /// Maximum number of cached responses before LRU eviction.
    pub cache_capacity: usize,
    /// Cache entry time-to-live in milliseconds.
    pub cache_ttl_ms: u64,
    /// Emit request start/finish events (requires the `tracing` feature).
    pub show_progress: bool,
}

impl ClientConfig {
    /// Creates a configuration with defaults for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 0,
            headers: Vec::new(),
            cache_capacity: 64,
            cache_ttl_ms: 60_000,
            show_progress: false,
        }
    }
}

/// Per-call overrides; unset fields inherit [`ClientConfig`].
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Consult and populate the response cache for this call.
    pub cache: bool,
    /// Override the retry bound.
    pub retry: Option<usize>,
    /// Override the inter-attempt delay in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// Override the per-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Headers for this call only, applied after the client defaults.
    pub headers: Vec<(String, String)>,
    /// Token that lets the caller abort the call mid-flight.
    pub cancel: Option<CancelToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves this call from the response cache when a fresh entry exists.
    pub fn cached(mut self) -> Self {
        self.cache = true;
        self
    }

    /// Overrides the retry bound for this call.
    pub fn retries(mut self, count: usize) -> Self {
        self.retry = Some(count);
        self
    }

    /// Overrides the inter-attempt delay for this call.
    pub fn retry_delay(mut self, ms: u64) -> Self {
        self.retry_delay_ms = Some(ms);
        self
    }

    /// Overrides the per-attempt timeout for this call.
    pub fn timeout(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Adds a header for this call only.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attaches a cancel token to this call.
    pub fn cancel(mut self, token: &CancelToken) -> Self {
        self.cancel = Some(token.clone());
        self
    }
}

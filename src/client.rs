use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{header, Method, StatusCode};
use tokio::time::{sleep, timeout};

use crate::{
    cache::ResponseCache,
    hooks::{ErrorHook, RefreshHook},
    interceptor,
    token::{normalize_bearer, FileTokenStore, TokenStore},
    CancelToken, ClientConfig, RelayError, RequestDescriptor, RequestInterceptor, RequestOptions,
    Response, ResponseInterceptor, Result,
};

/// HTTP request facade composing caching, retries and token refresh.
///
/// Every call runs the same pipeline: cache lookup → request
/// interceptors → bounded retry loop around the transport (with the 401
/// refresh gate) → response interceptors → cache store. Clones share the
/// underlying connection pool, cache and token store.
#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    cache: Arc<ResponseCache>,
    tokens: Arc<dyn TokenStore>,
    request_interceptors: Vec<RequestInterceptor>,
    response_interceptors: Vec<ResponseInterceptor>,
    refresh: Option<RefreshHook>,
    on_error: Option<ErrorHook>,
}

impl fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayClient")
            .field("base_url", &self.config.base_url)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .field("has_refresh_hook", &self.refresh.is_some())
            .finish()
    }
}

impl RelayClient {
    /// Creates a client with default configuration for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(base_url))
    }

    /// Creates a client from an explicit configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        let cache = ResponseCache::new(
            config.cache_capacity,
            Duration::from_millis(config.cache_ttl_ms),
        );
        Self {
            http: reqwest::Client::new(),
            config: Arc::new(config),
            cache: Arc::new(cache),
            tokens: Arc::new(FileTokenStore::new()),
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            refresh: None,
            on_error: None,
        }
    }

    /// Creates a client from the `RELAY_BASE_URL` environment variable.
    ///
    /// Returns an error if the variable is missing or empty.
    pub fn from_env() -> std::result::Result<Self, String> {
        let base_url = std::env::var("RELAY_BASE_URL")
            .map_err(|_| "missing RELAY_BASE_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("RELAY_BASE_URL is set but empty".to_owned());
        }
        Ok(Self::new(base_url))
    }

    /// Replaces the token store shared by all clones of this client.
    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.tokens = store;
        self
    }

    /// Registers the async token-refresh operation invoked on a 401.
    pub fn with_refresh_hook<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let hook = move || -> BoxFuture<'static, Result<String>> { Box::pin(hook()) };
        self.refresh = Some(Arc::new(hook));
        self
    }

    /// Appends a request interceptor; interceptors run in registration order.
    pub fn with_request_interceptor<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(RequestDescriptor) -> Result<RequestDescriptor> + Send + Sync + 'static,
    {
        self.request_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends a response interceptor; interceptors run in registration order.
    pub fn with_response_interceptor<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(Response) -> Result<Response> + Send + Sync + 'static,
    {
        self.response_interceptors.push(Arc::new(interceptor));
        self
    }

    /// Registers the hook every surfaced error passes through.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(RelayError) -> RelayError + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Creates a token that aborts the call it is attached to via
    /// [`RequestOptions::cancel`].
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken::new()
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(RequestDescriptor::new(Method::GET, path).with_options(options))
            .await
    }

    pub async fn post(
        &self,
        path: &str,
        body: impl serde::Serialize,
        options: RequestOptions,
    ) -> Result<Response> {
        let body = encode_body(body)?;
        self.request(
            RequestDescriptor::new(Method::POST, path)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    pub async fn put(
        &self,
        path: &str,
        body: impl serde::Serialize,
        options: RequestOptions,
    ) -> Result<Response> {
        let body = encode_body(body)?;
        self.request(
            RequestDescriptor::new(Method::PUT, path)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<Response> {
        self.request(RequestDescriptor::new(Method::DELETE, path).with_options(options))
            .await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: impl serde::Serialize,
        options: RequestOptions,
    ) -> Result<Response> {
        let body = encode_body(body)?;
        self.request(
            RequestDescriptor::new(Method::PATCH, path)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    /// Dispatches a fully-built descriptor through the whole pipeline.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<Response> {
        match self.dispatch(descriptor).await {
            Ok(response) => Ok(response),
            Err(err) => Err(self.surface(err)),
        }
    }

    fn surface(&self, err: RelayError) -> RelayError {
        match &self.on_error {
            Some(hook) => hook(err),
            None => err,
        }
    }

    async fn dispatch(&self, descriptor: RequestDescriptor) -> Result<Response> {
        let cancel = descriptor.options.cancel.clone();
        if cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(RelayError::Cancelled);
        }

        // The key is derived from the caller's descriptor, before any
        // interceptor transforms it.
        let key = descriptor.options.cache.then(|| descriptor.cache_key());
        if let Some(key) = &key {
            if let Some(hit) = self.cache.lookup(key) {
                #[cfg(feature = "tracing")]
                tracing::debug!(key = %key, "serving response from cache");
                return Ok(hit);
            }
        }

        #[cfg(feature = "tracing")]
        if self.config.show_progress {
            tracing::info!(method = %descriptor.method, path = %descriptor.path, "request started");
        }

        let descriptor = interceptor::apply_request(&self.request_interceptors, descriptor)?;

        let retries = descriptor.options.retry.unwrap_or(self.config.max_retries);
        let timeout_ms = descriptor
            .options
            .timeout_ms
            .unwrap_or(self.config.timeout_ms);
        let delay_ms = descriptor
            .options
            .retry_delay_ms
            .unwrap_or(self.config.retry_delay_ms);

        // Refresh-gate state spans all attempts of this invocation, so a
        // 401 can trigger at most one refresh per logical request.
        let mut refreshed = false;
        let mut attempt = 0usize;
        let response = loop {
            if attempt > 0 {
                wait_between_attempts(delay_ms, &cancel).await?;
            }

            match self
                .attempt(&descriptor, timeout_ms, &mut refreshed, &cancel)
                .await
            {
                Ok(response) => break response,
                Err(err) if err.is_retryable() && attempt < retries => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt = attempt + 1, error = %err, "retrying request");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        let response = interceptor::apply_response(&self.response_interceptors, response)?;

        if let Some(key) = key {
            self.cache.store(key, response.clone());
        }

        #[cfg(feature = "tracing")]
        if self.config.show_progress {
            tracing::info!(status = response.status, "request finished");
        }

        Ok(response)
    }

    /// One attempt: the transport call plus the 401 refresh gate, raced
    /// against the per-attempt timer and the caller's cancel token.
    ///
    /// Dropping the losing future aborts the in-flight network call, so
    /// neither a timed-out attempt nor a cancelled one keeps running in
    /// the background.
    async fn attempt(
        &self,
        descriptor: &RequestDescriptor,
        timeout_ms: u64,
        refreshed: &mut bool,
        cancel: &Option<CancelToken>,
    ) -> Result<Response> {
        let work = self.attempt_inner(descriptor, refreshed);
        let timed = timeout(Duration::from_millis(timeout_ms), work);

        match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(RelayError::Cancelled),
                outcome = timed => match outcome {
                    Ok(result) => result,
                    Err(_) => Err(RelayError::Timeout { timeout_ms }),
                },
            },
            None => match timed.await {
                Ok(result) => result,
                Err(_) => Err(RelayError::Timeout { timeout_ms }),
            },
        }
    }

    async fn attempt_inner(
        &self,
        descriptor: &RequestDescriptor,
        refreshed: &mut bool,
    ) -> Result<Response> {
        let auth = self.tokens.load().map(|token| normalize_bearer(&token));
        let response = self.send_once(descriptor, auth.as_deref()).await?;

        if response.status == StatusCode::UNAUTHORIZED.as_u16() && !*refreshed {
            if let Some(hook) = &self.refresh {
                *refreshed = true;
                return self.refresh_and_reissue(descriptor, hook.clone()).await;
            }
        }

        ensure_success(response)
    }

    /// Refresh gate: renew the token once, persist it and reissue the
    /// original descriptor with the fresh credentials.
    ///
    /// A refresh failure surfaces immediately and is never retried. A
    /// second 401 on the reissue surfaces as a plain HTTP error.
    async fn refresh_and_reissue(
        &self,
        descriptor: &RequestDescriptor,
        hook: RefreshHook,
    ) -> Result<Response> {
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %descriptor.path, "got 401, refreshing token");

        let token = hook()
            .await
            .map_err(|err| RelayError::AuthRefresh(err.to_string()))?;
        self.tokens.save(&token).map_err(|err| {
            RelayError::AuthRefresh(format!("could not persist refreshed token: {err}"))
        })?;

        let auth = normalize_bearer(&token);
        let response = self.send_once(descriptor, Some(&auth)).await?;
        ensure_success(response)
    }

    /// Transport primitive: exactly one network call.
    ///
    /// Returns the response at any status; classification into success,
    /// refresh-gate input or error happens in the caller.
    async fn send_once(
        &self,
        descriptor: &RequestDescriptor,
        auth: Option<&str>,
    ) -> Result<Response> {
        let url = join_url(&self.config.base_url, &descriptor.path);
        let mut request = self.http.request(descriptor.method.clone(), url);

        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        for (name, value) in &descriptor.options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = auth {
            request = request.header(header::AUTHORIZATION, auth);
        }
        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(RelayError::Transport)?;
        let status = response.status().as_u16();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_owned(), value.to_owned());
            }
        }

        let text = response.text().await.map_err(RelayError::Transport)?;
        let body = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn encode_body(body: impl serde::Serialize) -> Result<serde_json::Value> {
    serde_json::to_value(body)
        .map_err(|err| RelayError::Decode(format!("could not serialize request body: {err}")))
}

fn ensure_success(response: Response) -> Result<Response> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(RelayError::Http {
            status: response.status,
            body: body_text(&response.body),
        })
    }
}

fn body_text(body: &serde_json::Value) -> String {
    match body {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() || path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// The inter-attempt delay runs outside the per-attempt timer and is
/// itself raced against cancellation.
async fn wait_between_attempts(delay_ms: u64, cancel: &Option<CancelToken>) -> Result<()> {
    if delay_ms == 0 {
        return Ok(());
    }
    let pause = sleep(Duration::from_millis(delay_ms));
    match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(RelayError::Cancelled),
            _ = pause => Ok(()),
        },
        None => {
            pause.await;
            Ok(())
        }
    }
}

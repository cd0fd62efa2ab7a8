use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{RelayError, Result};

/// Asynchronous token-refresh operation supplied at client construction.
///
/// Invoked at most once per logical request, when a response comes back
/// with status 401. The returned token is persisted and used for the
/// reissued request. Concurrent requests may each trigger a refresh; the
/// last persisted token wins.
pub type RefreshHook = Arc<dyn Fn() -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// Hook every surfaced error passes through before reaching the caller.
///
/// Intended for logging and telemetry; the hook receives the error and
/// returns it (usually unchanged).
pub type ErrorHook = Arc<dyn Fn(RelayError) -> RelayError + Send + Sync>;

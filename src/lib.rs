//! `relay-http` is an async HTTP request facade over `reqwest`.
//!
//! Every call runs through the same pipeline: cache lookup → request
//! interceptors → bounded retry loop around the transport (with a 401
//! token-refresh gate) → response interceptors → cache store.
//!
//! - [`RelayClient::get`], [`RelayClient::post`], [`RelayClient::put`],
//!   [`RelayClient::delete`], [`RelayClient::patch`]
//! - [`RequestOptions`] for per-call cache/retry/timeout overrides
//! - [`CancelToken`] for caller-side cancellation

mod cache;
mod cancel;
mod client;
mod error;
mod hooks;
mod interceptor;
mod options;
mod request;
mod token;

pub use cancel::CancelToken;
pub use client::RelayClient;
pub use error::RelayError;
pub use hooks::{ErrorHook, RefreshHook};
pub use interceptor::{RequestInterceptor, ResponseInterceptor};
pub use options::{ClientConfig, RequestOptions};
pub use request::{RequestDescriptor, Response};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};

pub use reqwest::Method;

pub type Result<T> = std::result::Result<T, RelayError>;

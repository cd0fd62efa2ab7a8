use std::collections::BTreeMap;

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::{RelayError, RequestOptions, Result};

/// Immutable description of one outgoing HTTP call.
///
/// A fresh descriptor is built per facade call; only the request
/// interceptor pipeline transforms it, by consuming and returning it.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Path joined onto the client base URL, or a full URL.
    pub path: String,
    /// Optional JSON body payload.
    pub body: Option<serde_json::Value>,
    /// Per-call flags, headers and bounds.
    pub options: RequestOptions,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a per-call header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.push((name.into(), value.into()));
        self
    }

    /// Deterministic cache key derived from method, path and body.
    ///
    /// `serde_json` serializes object keys in sorted order, so two bodies
    /// with the same content always produce the same key.
    pub fn cache_key(&self) -> String {
        let body = self
            .body
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        format!("{} {} {}", self.method, self.path, body)
    }
}

/// Response surfaced to callers after the interceptor pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers with string-representable values.
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body; non-JSON payloads are kept as a JSON string.
    pub body: serde_json::Value,
}

impl Response {
    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|err| RelayError::Decode(format!("invalid response body: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::{RequestDescriptor, Response};
    use crate::RelayError;

    #[test]
    fn cache_key_is_deterministic_across_body_key_order() {
        let first: serde_json::Value =
            serde_json::from_str(r#"{"a":1,"b":2}"#).expect("must parse");
        let second: serde_json::Value =
            serde_json::from_str(r#"{"b":2,"a":1}"#).expect("must parse");

        let left = RequestDescriptor::new(Method::POST, "/users").with_body(first);
        let right = RequestDescriptor::new(Method::POST, "/users").with_body(second);
        assert_eq!(left.cache_key(), right.cache_key());
    }

    #[test]
    fn cache_key_distinguishes_method_path_and_body() {
        let get = RequestDescriptor::new(Method::GET, "/users/1");
        let post = RequestDescriptor::new(Method::POST, "/users/1");
        let other_path = RequestDescriptor::new(Method::GET, "/users/2");
        let with_body =
            RequestDescriptor::new(Method::GET, "/users/1").with_body(json!({"q": true}));

        assert_ne!(get.cache_key(), post.cache_key());
        assert_ne!(get.cache_key(), other_path.cache_key());
        assert_ne!(get.cache_key(), with_body.cache_key());
    }

    #[test]
    fn json_decodes_typed_body() {
        #[derive(serde::Deserialize)]
        struct User {
            id: u64,
        }

        let response = Response {
            status: 200,
            headers: Default::default(),
            body: json!({"id": 7}),
        };
        let user: User = response.json().expect("must decode");
        assert_eq!(user.id, 7);
    }

    #[test]
    fn json_mismatch_is_a_decode_error() {
        let response = Response {
            status: 200,
            headers: Default::default(),
            body: json!("not an object"),
        };
        let err = response.json::<Vec<u64>>().expect_err("must fail");
        assert!(matches!(err, RelayError::Decode(_)));
    }
}

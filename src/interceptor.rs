use std::sync::Arc;

use crate::{RequestDescriptor, Response, Result};

/// Transforms the outgoing descriptor before the transport call.
///
/// Interceptors run in registration order; the first error aborts the call.
pub type RequestInterceptor =
    Arc<dyn Fn(RequestDescriptor) -> Result<RequestDescriptor> + Send + Sync>;

/// Transforms the response after a successful transport call.
pub type ResponseInterceptor = Arc<dyn Fn(Response) -> Result<Response> + Send + Sync>;

pub(crate) fn apply_request(
    interceptors: &[RequestInterceptor],
    mut descriptor: RequestDescriptor,
) -> Result<RequestDescriptor> {
    for interceptor in interceptors {
        descriptor = interceptor(descriptor)?;
    }
    Ok(descriptor)
}

pub(crate) fn apply_response(
    interceptors: &[ResponseInterceptor],
    mut response: Response,
) -> Result<Response> {
    for interceptor in interceptors {
        response = interceptor(response)?;
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;

    use super::{apply_request, apply_response, RequestInterceptor, ResponseInterceptor};
    use crate::{RelayError, RequestDescriptor, Response};

    #[test]
    fn request_interceptors_run_in_registration_order() {
        let interceptors: Vec<RequestInterceptor> = vec![
            Arc::new(|descriptor| Ok(descriptor.header("x-order", "first"))),
            Arc::new(|descriptor| {
                let saw_first = descriptor
                    .options
                    .headers
                    .iter()
                    .any(|(name, value)| name == "x-order" && value == "first");
                assert!(saw_first, "second interceptor must see the first's output");
                Ok(descriptor.header("x-order", "second"))
            }),
        ];

        let descriptor = apply_request(
            &interceptors,
            RequestDescriptor::new(Method::GET, "/ordered"),
        )
        .expect("pipeline must succeed");

        let values: Vec<&str> = descriptor
            .options
            .headers
            .iter()
            .filter(|(name, _)| name == "x-order")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(values, ["first", "second"]);
    }

    #[test]
    fn failing_request_interceptor_aborts_the_pipeline() {
        let interceptors: Vec<RequestInterceptor> = vec![
            Arc::new(|_| Err(RelayError::Interceptor("rejected".to_owned()))),
            Arc::new(|descriptor| Ok(descriptor.header("x-never", "reached"))),
        ];

        let err = apply_request(
            &interceptors,
            RequestDescriptor::new(Method::GET, "/rejected"),
        )
        .expect_err("pipeline must fail");
        assert!(matches!(err, RelayError::Interceptor(_)));
    }

    #[test]
    fn response_interceptors_compose_in_order() {
        let interceptors: Vec<ResponseInterceptor> = vec![
            Arc::new(|mut response| {
                response.body["trail"] = serde_json::Value::String("one".to_owned());
                Ok(response)
            }),
            Arc::new(|mut response| {
                let trail = response.body["trail"].as_str().unwrap_or_default().to_owned();
                response.body["trail"] = serde_json::Value::String(format!("{trail},two"));
                Ok(response)
            }),
        ];

        let response = apply_response(
            &interceptors,
            Response {
                status: 200,
                headers: Default::default(),
                body: serde_json::json!({}),
            },
        )
        .expect("pipeline must succeed");
        assert_eq!(response.body["trail"], "one,two");
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let response = Response {
            status: 200,
            headers: Default::default(),
            body: serde_json::json!({"id": 1}),
        };
        let passed =
            apply_response(&[], response.clone()).expect("empty pipeline must succeed");
        assert_eq!(passed, response);
    }
}

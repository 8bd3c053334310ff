//! The built router and its per-request pipeline.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use euclid_contract::{validate_request, Lookup, OperationRegistry, RegisteredOperation, RequestParts};
use euclid_core::{
    response, BoxedFailureHandler, Failure, FailureContext, HandlerError, Request,
    RequestContext, RequestId, RequestLifecycle, RequestState, Response,
};
use euclid_router::Params;
use euclid_telemetry::metrics::{record_request, record_validation_failure};
use http::header::{HeaderValue, ALLOW};
use http::request::Parts;
use http::{Method, StatusCode};
use http_body_util::BodyExt;
use tracing::{debug, error, warn};

/// Operation label used in metrics for requests that matched nothing.
const UNMATCHED: &str = "unmatched";

/// The result of routing one request.
#[derive(Debug)]
pub struct Dispatch {
    /// The response to send.
    pub response: Response,
    /// The states the request went through. Always complete.
    pub lifecycle: RequestLifecycle,
    /// The matched operation, if any.
    pub operation_id: Option<String>,
    /// Id assigned to the request.
    pub request_id: RequestId,
}

/// A validating dispatch table built by
/// [`RouterFactory::get_router`](crate::RouterFactory::get_router).
///
/// Immutable and cheap to clone; any number of requests may be handled
/// concurrently.
#[derive(Clone)]
pub struct ApiRouter {
    inner: Arc<Inner>,
}

struct Inner {
    registry: OperationRegistry,
    failure_handler: Option<BoxedFailureHandler>,
}

impl std::fmt::Debug for ApiRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRouter")
            .field("operations", &self.inner.registry.len())
            .field("mounted", &self.inner.registry.mounted_count())
            .field("has_failure_handler", &self.inner.failure_handler.is_some())
            .finish()
    }
}

impl ApiRouter {
    pub(crate) fn new(
        registry: OperationRegistry,
        failure_handler: Option<BoxedFailureHandler>,
    ) -> Self {
        euclid_telemetry::describe_metrics();
        Self {
            inner: Arc::new(Inner {
                registry,
                failure_handler,
            }),
        }
    }

    /// Returns the operation registry.
    pub fn registry(&self) -> &OperationRegistry {
        &self.inner.registry
    }

    /// Handles a request.
    pub async fn handle(&self, request: Request) -> Response {
        self.handle_with_outcome(request).await.response
    }

    /// Handles a request and reports how it was routed.
    pub async fn handle_with_outcome(&self, request: Request) -> Dispatch {
        let started = Instant::now();
        let request_id = RequestId::new();
        let mut lifecycle = RequestLifecycle::new();

        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        let path = parts.uri.path().to_string();

        let (response, operation_id) = match self.inner.registry.lookup(&parts.method, &path) {
            Lookup::Found { entry, params } => {
                lifecycle.advance(RequestState::Matched);
                let response = self
                    .dispatch(entry, params, &parts, body, request_id, &mut lifecycle)
                    .await;
                (response, Some(entry.operation().id.clone()))
            }
            Lookup::MethodNotAllowed(allowed) => {
                lifecycle.advance(RequestState::Unmatched);
                (method_not_allowed(&parts.method, &path, &allowed), None)
            }
            Lookup::NotFound => {
                lifecycle.advance(RequestState::Unmatched);
                let message = format!("no operation matches {} {}", parts.method, path);
                (response::error(StatusCode::NOT_FOUND, "NOT_FOUND", &message), None)
            }
        };

        let outcome = lifecycle.state().to_string();
        debug!(
            request_id = %request_id,
            operation_id = operation_id.as_deref().unwrap_or(UNMATCHED),
            method = %parts.method,
            path = %path,
            status = response.status().as_u16(),
            outcome = %outcome,
            "request completed"
        );
        record_request(
            operation_id.as_deref().unwrap_or(UNMATCHED),
            &outcome,
            response.status().as_u16(),
            started.elapsed(),
        );

        Dispatch {
            response,
            lifecycle,
            operation_id,
            request_id,
        }
    }

    async fn dispatch(
        &self,
        entry: &RegisteredOperation,
        params: Params,
        parts: &Parts,
        body: Bytes,
        request_id: RequestId,
        lifecycle: &mut RequestLifecycle,
    ) -> Response {
        let operation = entry.operation();
        let params: Params = params
            .iter()
            .map(|(name, value)| (name.to_string(), decode(value)))
            .collect();
        let query = parse_query(parts.uri.query());

        lifecycle.advance(RequestState::Validating);
        let validated = validate_request(
            operation,
            entry.schemas(),
            self.inner.registry.schemas(),
            RequestParts {
                params: &params,
                query: &query,
                headers: &parts.headers,
                body: &body,
            },
        );

        let json = match validated {
            Ok(json) => json,
            Err(exception) => {
                lifecycle.advance(RequestState::Invalid);
                warn!(
                    request_id = %request_id,
                    operation_id = %operation.id,
                    path = exception.path(),
                    error_type = %exception.error_type(),
                    "request failed validation: {}",
                    exception.message()
                );
                record_validation_failure(&operation.id, &exception.error_type().to_string());
                let response = self.fail(
                    &operation.id,
                    request_id,
                    parts,
                    Failure::Validation(exception),
                );
                lifecycle.advance(RequestState::FailureHandled);
                return response;
            }
        };
        lifecycle.advance(RequestState::Valid);

        let Some(handler) = entry.handler() else {
            lifecycle.advance(RequestState::Dispatched);
            let message = format!("operation '{}' has no handler", operation.id);
            return response::error(StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED", &message);
        };

        let ctx = RequestContext::new(operation.id.as_str(), parts.method.clone(), parts.uri.path())
            .with_request_id(request_id)
            .with_params(params)
            .with_query(query)
            .with_headers(parts.headers.clone())
            .with_body(body, json);

        let result = handler(ctx).await;
        lifecycle.advance(RequestState::Dispatched);
        match result {
            Ok(response) => response,
            Err(err) => {
                error!(
                    request_id = %request_id,
                    operation_id = %operation.id,
                    status = err.status_code().as_u16(),
                    "handler failed: {err}"
                );
                self.fail(&operation.id, request_id, parts, Failure::Handler(err))
            }
        }
    }

    /// Produces the response for a failed request.
    fn fail(
        &self,
        operation_id: &str,
        request_id: RequestId,
        parts: &Parts,
        failure: Failure,
    ) -> Response {
        if let Some(handler) = &self.inner.failure_handler {
            return handler(FailureContext {
                operation_id: operation_id.to_string(),
                request_id,
                method: parts.method.clone(),
                path: parts.uri.path().to_string(),
                failure,
            });
        }
        default_failure_response(&failure)
    }
}

/// The built-in response for a failure: the validation exception as a 400
/// body, or the handler error's status with an error envelope.
pub fn default_failure_response(failure: &Failure) -> Response {
    match failure {
        Failure::Validation(exception) => response::json(StatusCode::BAD_REQUEST, exception),
        Failure::Handler(HandlerError::Failed { status, message }) => {
            response::error(*status, "HANDLER_FAILED", message)
        }
        Failure::Handler(HandlerError::Internal { .. }) => response::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "internal server error",
        ),
    }
}

fn method_not_allowed(method: &Method, path: &str, allowed: &[Method]) -> Response {
    let message = format!("method {method} is not allowed on {path}");
    let mut response = response::error(StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED", &message);
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// Splits a query string into decoded pairs, keeping order and repeats.
pub(crate) fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    query
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (decode_form(name), decode_form(value)),
            None => (decode_form(pair), String::new()),
        })
        .collect()
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn decode_form(raw: &str) -> String {
    decode(&raw.replace('+', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid_core::{ValidationErrorType, ValidationException};

    #[test]
    fn test_parse_query() {
        let pairs = parse_query(Some("tags=a&tags=b%20c&limit=10&flag&q=x+y"));
        assert_eq!(
            pairs,
            vec![
                ("tags".to_string(), "a".to_string()),
                ("tags".to_string(), "b c".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("flag".to_string(), String::new()),
                ("q".to_string(), "x y".to_string()),
            ]
        );
        assert!(parse_query(None).is_empty());
        assert!(parse_query(Some("")).is_empty());
    }

    #[test]
    fn test_decode_keeps_invalid_input() {
        assert_eq!(decode("caf%C3%A9"), "café");
        assert_eq!(decode("%FF"), "%FF");
    }

    #[tokio::test]
    async fn test_default_validation_response() {
        let failure = Failure::Validation(ValidationException::new(
            ValidationErrorType::MissingRequired,
            "$.age",
            "missing required property 'age'",
        ));
        let response = default_failure_response(&failure);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value =
            serde_json::from_str(&response::body_string(response).await).unwrap();
        assert_eq!(body["kind"], "ValidationException");
        assert_eq!(body["path"], "$.age");
    }

    #[tokio::test]
    async fn test_default_handler_error_response_hides_details() {
        let failure = Failure::Handler(HandlerError::internal("database password rejected"));
        let response = default_failure_response(&failure);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response::body_string(response).await;
        assert!(!body.contains("password"));
        assert!(body.contains("INTERNAL_ERROR"));
    }

    #[test]
    fn test_allow_header() {
        let response = method_not_allowed(&Method::DELETE, "/pets", &[Method::GET, Method::POST]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET, POST");
    }
}

//! Response type and constructors.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use serde::Serialize;

/// The HTTP response type produced by handlers and the router.
pub type Response = http::Response<Full<Bytes>>;

/// The HTTP request type accepted by the router.
pub type Request = http::Request<Full<Bytes>>;

/// Builds a response with a fixed content type.
fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// A `text/plain` response.
#[must_use]
pub fn text(status: StatusCode, body: impl Into<String>) -> Response {
    with_body(status, "text/plain; charset=utf-8", Bytes::from(body.into()))
}

/// An `application/json` response. Serialisation failures yield a 500.
#[must_use]
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => with_body(status, "application/json", Bytes::from(bytes)),
        Err(err) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERIALIZATION_FAILED",
            &err.to_string(),
        ),
    }
}

/// A JSON error envelope `{"error":{"code":..,"message":..}}`.
#[must_use]
pub fn error(status: StatusCode, code: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "code": code,
            "message": message,
        }
    });
    with_body(status, "application/json", Bytes::from(body.to_string()))
}

/// A response with no body.
#[must_use]
pub fn empty(status: StatusCode) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Collects a response body into a string, lossily.
pub async fn body_string(response: Response) -> String {
    match response.into_body().collect().await {
        Ok(collected) => String::from_utf8_lossy(&collected.to_bytes()).into_owned(),
        Err(never) => match never {},
    }
}

//! Request context handed to operation handlers.

use std::time::{Duration, Instant};

use bytes::Bytes;
use euclid_router::Params;
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::HandlerError;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for one request sortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a handler sees about a request that passed validation.
///
/// # Example
///
/// ```
/// use euclid_core::RequestContext;
/// use http::Method;
///
/// let ctx = RequestContext::new("showPetById", Method::GET, "/pets/7");
/// assert_eq!(ctx.operation_id(), "showPetById");
/// assert!(ctx.body().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    operation_id: String,
    method: Method,
    path: String,
    params: Params,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    raw_body: Bytes,
    body: Option<serde_json::Value>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with no parameters, headers or body.
    #[must_use]
    pub fn new(operation_id: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            operation_id: operation_id.into(),
            method,
            path: path.into(),
            params: Params::new(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            raw_body: Bytes::new(),
            body: None,
            started_at: Instant::now(),
        }
    }

    /// Replaces the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the captured path parameters.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Sets the decoded query pairs.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Sets the request headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the raw body and its parsed JSON form.
    #[must_use]
    pub fn with_body(mut self, raw: Bytes, body: Option<serde_json::Value>) -> Self {
        self.raw_body = raw;
        self.body = body;
        self
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the matched operation id.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a decoded path parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns all path parameters.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the first query value for `name`.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every decoded query pair in request order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw request body.
    #[must_use]
    pub const fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// Returns the validated JSON body, if the request carried one.
    #[must_use]
    pub const fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Deserialises the validated body into `T`.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let body = self
            .body
            .clone()
            .ok_or_else(|| HandlerError::failed(http::StatusCode::BAD_REQUEST, "request has no body"))?;
        serde_json::from_value(body)
            .map_err(|e| HandlerError::internal_with_source("failed to decode request body", e))
    }

    /// Returns the time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pet {
        name: String,
        age: u32,
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn test_accessors() {
        let mut params = Params::new();
        params.push("petId", "7");
        let ctx = RequestContext::new("showPetById", Method::GET, "/pets/7")
            .with_params(params)
            .with_query(vec![
                ("tag".to_string(), "cat".to_string()),
                ("tag".to_string(), "dog".to_string()),
            ]);

        assert_eq!(ctx.param("petId"), Some("7"));
        assert_eq!(ctx.query("tag"), Some("cat"));
        assert_eq!(ctx.query_pairs().len(), 2);
        assert_eq!(ctx.method(), &Method::GET);
        assert_eq!(ctx.path(), "/pets/7");
    }

    #[test]
    fn test_body_as_typed() {
        let body = json!({"name": "Rex", "age": 3});
        let ctx = RequestContext::new("createPet", Method::POST, "/pets")
            .with_body(Bytes::from(body.to_string()), Some(body));

        let pet: Pet = ctx.body_as().unwrap();
        assert_eq!(pet, Pet { name: "Rex".to_string(), age: 3 });
    }

    #[test]
    fn test_body_as_without_body() {
        let ctx = RequestContext::new("createPet", Method::POST, "/pets");
        let err = ctx.body_as::<Pet>().unwrap_err();
        assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    }
}

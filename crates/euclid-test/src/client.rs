//! In-memory client for an [`ApiRouter`].

use bytes::Bytes;
use euclid_factory::ApiRouter;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use http_body_util::Full;
use serde::Serialize;

use crate::error::TestError;
use crate::response::TestResponse;

/// Sends requests straight into a router, without a socket.
///
/// # Example
///
/// ```
/// use euclid_core::{response, HandlerError, RequestContext};
/// use euclid_factory::{FactoryOptions, RouterFactory};
/// use euclid_test::TestClient;
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let spec = "openapi: 3.0.0\npaths:\n  /ping:\n    get:\n      operationId: ping\n";
/// let mut factory = RouterFactory::from_str(spec, FactoryOptions::default()).await.unwrap();
/// factory
///     .add_handler_by_operation_id("ping", |_ctx: RequestContext| async {
///         Ok::<_, HandlerError>(response::text(StatusCode::OK, "pong"))
///     })
///     .unwrap();
///
/// let client = TestClient::new(factory.get_router().unwrap());
/// let response = client.get("/ping").send().await;
/// assert_eq!(response.text().unwrap(), "pong");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TestClient {
    router: ApiRouter,
    default_headers: HeaderMap,
}

impl TestClient {
    /// Wraps a router.
    #[must_use]
    pub fn new(router: ApiRouter) -> Self {
        Self {
            router,
            default_headers: HeaderMap::new(),
        }
    }

    /// Adds a header sent with every request.
    ///
    /// # Panics
    ///
    /// Panics if the name or value is not a valid header.
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::try_from(name).expect("valid header name");
        let value = HeaderValue::try_from(value).expect("valid header value");
        self.default_headers.insert(name, value);
        self
    }

    /// Returns the wrapped router.
    #[must_use]
    pub fn router(&self) -> &ApiRouter {
        &self.router
    }

    /// Creates a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Creates a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestRequest<'_> {
        TestRequest {
            client: self,
            method,
            uri: uri.as_ref().to_string(),
            headers: self.default_headers.clone(),
            body: Bytes::new(),
            error: None,
        }
    }
}

/// A request being built for a [`TestClient`].
#[must_use]
pub struct TestRequest<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = HeaderName::try_from(name.as_ref());
        let value = HeaderValue::try_from(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(format!("invalid header name: {e}")),
            (_, Err(e)) => self.fail(format!("invalid header value: {e}")),
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.error = Some(TestError::Json(e)),
        }
        self.content_type("application/json")
    }

    fn fail(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(TestError::RequestBuild(message));
        }
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("request failed: {e}"),
        }
    }

    /// Sends the request, returning build errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut builder = http::Request::builder().method(self.method).uri(self.uri.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers);
        }
        let request = builder
            .body(Full::new(self.body))
            .map_err(|e| TestError::RequestBuild(e.to_string()))?;

        let dispatch = self.client.router.handle_with_outcome(request).await;
        Ok(TestResponse::collect(dispatch.response, dispatch.lifecycle, dispatch.operation_id).await)
    }
}

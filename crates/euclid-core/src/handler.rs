//! Handler and failure handler callbacks.
//!
//! Operation handlers are async closures taking the [`RequestContext`] of a
//! validated request. Failure handlers are plain closures: they receive a
//! [`FailureContext`] and must produce the response synchronously, so a
//! failed request always completes.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use http::Method;

use crate::{Failure, HandlerError, RequestContext, RequestId, Response};

/// Future returned by an erased operation handler.
pub type HandlerFuture = BoxFuture<'static, Result<Response, HandlerError>>;

/// A type-erased operation handler.
pub type BoxedHandler = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// A type-erased failure handler.
pub type BoxedFailureHandler = Arc<dyn Fn(FailureContext) -> Response + Send + Sync>;

/// Handles requests for one operation.
///
/// Implemented for every `Fn(RequestContext) -> impl Future<Output =
/// Result<Response, HandlerError>>` closure, so async closures can be bound
/// directly:
///
/// ```
/// use euclid_core::{response, Handler, HandlerError, RequestContext, Response};
/// use http::StatusCode;
///
/// async fn show_pet(ctx: RequestContext) -> Result<Response, HandlerError> {
///     Ok(response::text(StatusCode::OK, ctx.param("petId").unwrap_or("none")))
/// }
///
/// let handler = show_pet.into_boxed();
/// # let _ = handler;
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles one validated request.
    fn handle(&self, ctx: RequestContext) -> HandlerFuture;

    /// Erases the handler type.
    fn into_boxed(self) -> BoxedHandler
    where
        Self: Sized,
    {
        Arc::new(move |ctx| self.handle(ctx))
    }
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, HandlerError>> + Send + 'static,
{
    fn handle(&self, ctx: RequestContext) -> HandlerFuture {
        Box::pin((self)(ctx))
    }
}

/// What a failure handler is told about a failed request.
#[derive(Debug)]
pub struct FailureContext {
    /// Id of the matched operation.
    pub operation_id: String,
    /// Id of the request.
    pub request_id: RequestId,
    /// Request method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Why the request failed.
    pub failure: Failure,
}

//! # Euclid Core
//!
//! Types shared by every Euclid crate:
//!
//! - [`BuildError`] and the build-time errors it wraps
//! - [`ValidationException`] - structured per-request validation failure
//! - [`HandlerError`] and [`Failure`] - keeps validation and handler failures apart
//! - [`RequestContext`] - what a handler sees about a validated request
//! - [`Handler`] - operation handler callbacks
//! - [`RequestLifecycle`] - the per-request state machine

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod lifecycle;
pub mod response;
mod validation;

pub use context::{RequestContext, RequestId};
pub use error::{
    BuildError, BuildResult, DuplicateOperationError, Failure, HandlerError,
    SchemaResolutionError, SpecLoadError,
};
pub use handler::{BoxedFailureHandler, BoxedHandler, FailureContext, Handler, HandlerFuture};
pub use lifecycle::{RequestLifecycle, RequestState};
pub use response::{Request, Response};
pub use validation::{ValidationErrorType, ValidationException};

//! Radix tree dispatch table for Euclid.
//!
//! Maps `(path template, method)` pairs to an arbitrary value, usually the
//! index of an operation in a registry. Lookup is proportional to the number
//! of path segments, not to the number of registered routes.
//!
//! # Example
//!
//! ```rust
//! use euclid_router::{MethodRouter, RouteLookup, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert("/pets", MethodRouter::new().get(0usize).post(1)).unwrap();
//! router.insert("/pets/{petId}", MethodRouter::new().get(2)).unwrap();
//!
//! let found = router.match_route(&Method::GET, "/pets/42").unwrap();
//! assert_eq!(*found.value, 2);
//! assert_eq!(found.params.get("petId"), Some("42"));
//!
//! assert!(matches!(
//!     router.lookup(&Method::DELETE, "/pets"),
//!     RouteLookup::MethodNotAllowed(_)
//! ));
//! ```
//!
//! # Layout
//!
//! ```text
//!            (root)
//!              │
//!            "pets"  [GET, POST]
//!              │
//!          "{petId}" [GET]
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod method_router;
mod node;
mod params;
mod router;

pub use error::RouteError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

use http::Method;

/// A matched entry with the parameters captured from the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the template and method.
    pub value: &'a T,
    /// Captured path parameters.
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}

/// Outcome of resolving a request against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLookup<'a, T> {
    /// Path and method both matched.
    Found(RouteMatch<'a, T>),
    /// The path matched a template but not for this method.
    MethodNotAllowed(Vec<Method>),
    /// No template matched the path.
    NotFound,
}

//! # Euclid
//!
//! **Contract-validating HTTP routers built from OpenAPI 3 documents**
//!
//! Euclid reads an OpenAPI specification, dereferences every schema it uses
//! (local pointers, other files, remote documents, recursive definitions),
//! and builds a dispatch table in which each operation validates its
//! parameters and JSON body before the bound handler runs.
//!
//! ## Quick Start
//!
//! ```rust
//! use euclid::prelude::*;
//! use http::StatusCode;
//!
//! const SPEC: &str = r#"
//! openapi: 3.0.3
//! paths:
//!   /persons:
//!     post:
//!       operationId: createPerson
//!       requestBody:
//!         required: true
//!         content:
//!           application/json:
//!             schema:
//!               type: object
//!               required: [name, age]
//!               properties:
//!                 name: { type: string }
//!                 age: { type: integer, minimum: 0 }
//! "#;
//!
//! # tokio_test::block_on(async {
//! let mut factory = RouterFactory::from_str(SPEC, FactoryOptions::default()).await?;
//! factory.add_handler_by_operation_id("createPerson", |ctx: RequestContext| async move {
//!     let name = ctx.body().and_then(|b| b["name"].as_str()).unwrap_or_default().to_string();
//!     Ok::<_, HandlerError>(response::text(StatusCode::CREATED, name))
//! })?;
//!
//! let router = factory.get_router()?;
//! let request = http::Request::post("/persons")
//!     .header("content-type", "application/json")
//!     .body(r#"{"name":"Alice","age":-1}"#.into())
//!     .unwrap();
//! assert_eq!(router.handle(request).await.status(), StatusCode::BAD_REQUEST);
//! # Ok::<(), BuildError>(())
//! # }).unwrap();
//! ```
//!
//! ## Request lifecycle
//!
//! ```text
//! Received → Matched → Validating → Valid → Dispatched
//!     ↓                     ↓
//! Unmatched              Invalid → FailureHandled
//! ```

#![doc(html_root_url = "https://docs.rs/euclid/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use euclid_core as core;

// Re-export the dispatch table
pub use euclid_router as router;

// Re-export schema resolution and validation
pub use euclid_schema as schema;

// Re-export specification loading and the operation registry
pub use euclid_contract as contract;

// Re-export the router factory
pub use euclid_factory as factory;

// Re-export configuration
pub use euclid_config as config;

// Re-export logging and metrics
pub use euclid_telemetry as telemetry;

pub use euclid_factory::{ApiRouter, FactoryOptions, RouterFactory};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use euclid::prelude::*;
/// ```
pub mod prelude {
    pub use euclid_core::{
        response, BuildError, Failure, FailureContext, HandlerError, Request, RequestContext,
        RequestId, RequestState, Response, ValidationErrorType, ValidationException,
    };

    pub use euclid_factory::{default_failure_response, ApiRouter, Dispatch, FactoryOptions, RouterFactory};

    pub use euclid_schema::{ResolverOptions, Url};

    pub use euclid_config::{ConfigLoader, EuclidConfig};

    pub use euclid_telemetry::{init_logging, LogConfig};
}

//! # Euclid Contract
//!
//! The OpenAPI side of Euclid:
//!
//! - [`Specification`] loads a document and lists its [`Operation`]s
//! - [`Specification::resolve_schemas`] compiles every operation schema once
//! - [`validate_request`] checks parameters and body of one request
//! - [`OperationRegistry`] maps ids and routes to operations and handlers
//!
//! # Example
//!
//! ```
//! use euclid_contract::Specification;
//!
//! let spec = Specification::from_text(
//!     "openapi: 3.0.0\npaths:\n  /pets:\n    get:\n      operationId: listPets\n",
//! )
//! .unwrap();
//! assert_eq!(spec.operations()[0].id, "listPets");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod operation;
pub mod registry;
pub mod request;
pub mod spec;

pub use operation::{Operation, Parameter, ParameterLocation, RequestBody};
pub use registry::{Lookup, OperationRegistry, RegisteredOperation};
pub use request::{coerce, validate_request, RequestParts};
pub use spec::{OperationSchemas, ResolvedSpecification, Specification, IN_MEMORY_BASE};

//! # Euclid Factory
//!
//! Turns an OpenAPI 3 document into a validating router:
//!
//! 1. [`RouterFactory`] loads the document and resolves every schema,
//!    local and remote, within the build timeout.
//! 2. Handlers are bound with
//!    [`add_handler_by_operation_id`](RouterFactory::add_handler_by_operation_id)
//!    and the failure policy is chosen.
//! 3. [`RouterFactory::get_router`] produces an immutable [`ApiRouter`].
//!
//! Each request handled by the router is matched, validated against its
//! operation, then given to the handler or to the failure path. See
//! [`euclid_core::RequestState`] for the lifecycle.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod factory;
mod options;
mod router;

pub use factory::RouterFactory;
pub use options::FactoryOptions;
pub use router::{default_failure_response, ApiRouter, Dispatch};

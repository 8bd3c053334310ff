//! # Euclid Test
//!
//! Harness pieces for testing Euclid routers:
//!
//! - [`TestClient`] sends requests straight into an
//!   [`ApiRouter`](euclid_factory::ApiRouter) and exposes the response
//!   together with the request lifecycle.
//! - [`SchemaServer`] serves a directory over HTTP on an ephemeral port so
//!   remote schema references resolve against a real socket.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod response;
mod schema_server;

pub use client::{TestClient, TestRequest};
pub use error::TestError;
pub use response::TestResponse;
pub use schema_server::SchemaServer;

//! Layered configuration for Euclid.
//!
//! ```toml
//! [factory]
//! mount_operations_without_handlers = false
//! validation_failure_handler_enabled = true
//! build_timeout_ms = 30000
//!
//! [resolver]
//! remote_base = "http://localhost:8081/"
//! fetch_timeout_ms = 10000
//! max_validation_depth = 128
//! max_documents = 64
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Every key can be overridden with `PREFIX__SECTION__KEY` environment
//! variables, e.g. `EUCLID__RESOLVER__REMOTE_BASE`. Unknown keys in files
//! are rejected.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{EuclidConfig, EuclidConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{FactoryConfig, LogFormat, LoggingConfig, ResolverConfig};

//! Observability for Euclid routers.
//!
//! - [`logging`]: installs a `tracing` subscriber (JSON, pretty or compact)
//! - [`metrics`]: request and validation counters through the `metrics` facade
//!
//! Nothing here is required to route requests. Without a subscriber the
//! router's `tracing` events are dropped, and without a recorder its
//! counters are no-ops.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, try_init_logging, LogConfig, LogFormat};
pub use crate::metrics::{describe_metrics, record_request, record_validation_failure};

/// Result type for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

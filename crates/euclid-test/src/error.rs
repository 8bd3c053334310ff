//! Test error types.

use thiserror::Error;

/// Errors raised by the test harness.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// The response body was not what the caller expected.
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON (de)serialisation failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The schema server could not bind.
    #[error("failed to bind schema server: {0}")]
    Bind(#[source] std::io::Error),

    /// The schema server is not running.
    #[error("schema server is not running")]
    NotRunning,
}

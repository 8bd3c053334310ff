//! Structured logging.
//!
//! Euclid crates log through `tracing`. This module installs a global
//! subscriber: an [`EnvFilter`] (honouring `RUST_LOG` when set) in front of a
//! `fmt` layer in JSON, pretty or compact form.
//!
//! # Example
//!
//! ```rust,no_run
//! use euclid_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development()).unwrap();
//! tracing::info!(operation_id = "listPets", "router ready");
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line, human readable.
    Pretty,
    /// Single-line, human readable.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether to install a subscriber at all.
    pub enabled: bool,
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `euclid_factory=debug,info`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Include source file and line.
    pub include_location: bool,
    /// Include the module path.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            include_location: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Human-readable debug output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            ..Self::default()
        }
    }

    /// JSON output at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Builds the filter, preferring `RUST_LOG` over `level`.
    pub fn filter(&self) -> TelemetryResult<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        create_env_filter(&self.level)
    }
}

/// Parses a filter directive.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        message: e.to_string(),
    })
}

/// Installs the global subscriber.
///
/// Fails if the filter is invalid or a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }
    let filter = config.filter()?;

    let layer = tracing_subscriber::fmt::layer()
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_target(config.include_target);
    let layer = match config.format {
        LogFormat::Json => layer.json().with_filter(filter).boxed(),
        LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => layer.compact().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Like [`init_logging`], but an already installed subscriber is not an
/// error. Returns true if this call installed one.
pub fn try_init_logging(config: &LogConfig) -> TelemetryResult<bool> {
    match init_logging(config) {
        Ok(()) => Ok(config.enabled),
        Err(TelemetryError::LoggingInit(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Field names used in request logs.
pub mod fields {
    /// Request id.
    pub const REQUEST_ID: &str = "request_id";
    /// Operation id.
    pub const OPERATION_ID: &str = "operation_id";
    /// Terminal request state.
    pub const OUTCOME: &str = "outcome";
    /// JSON path of a validation failure.
    pub const PATH: &str = "path";
}

//! Configuration sections.

use std::time::Duration;

use euclid_schema::{ResolverOptions, Url};
use euclid_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Router factory section.
///
/// # Example
///
/// ```
/// use euclid_config::FactoryConfig;
///
/// let config = FactoryConfig::default();
/// assert!(!config.mount_operations_without_handlers);
/// assert_eq!(config.build_timeout_ms, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FactoryConfig {
    /// Mount operations that have no handler; they answer 501.
    #[serde(default)]
    pub mount_operations_without_handlers: bool,

    /// Route validation failures and handler errors to the failure handler.
    #[serde(default)]
    pub validation_failure_handler_enabled: bool,

    /// Upper bound on loading and resolving the specification.
    #[serde(default = "default_build_timeout")]
    pub build_timeout_ms: u64,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            mount_operations_without_handlers: false,
            validation_failure_handler_enabled: false,
            build_timeout_ms: default_build_timeout(),
        }
    }
}

impl FactoryConfig {
    /// Build timeout as a [`Duration`].
    pub fn build_timeout(&self) -> Duration {
        Duration::from_millis(self.build_timeout_ms)
    }
}

fn default_build_timeout() -> u64 {
    30_000
}

/// Schema resolver section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Base URL that relative document references in the root document
    /// resolve against.
    #[serde(default)]
    pub remote_base: Option<String>,

    /// Per-document fetch timeout.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_ms: u64,

    /// Maximum instance nesting the validator descends into.
    #[serde(default = "default_max_validation_depth")]
    pub max_validation_depth: usize,

    /// Maximum number of documents loaded per build, root included.
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,

    /// Treat objects without `additionalProperties` as closed.
    #[serde(default = "default_deny_undeclared_properties")]
    pub deny_undeclared_properties: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            remote_base: None,
            fetch_timeout_ms: default_fetch_timeout(),
            max_validation_depth: default_max_validation_depth(),
            max_documents: default_max_documents(),
            deny_undeclared_properties: default_deny_undeclared_properties(),
        }
    }
}

impl ResolverConfig {
    /// Parses `remote_base`.
    pub fn remote_base_url(&self) -> Result<Option<Url>, ConfigError> {
        self.remote_base
            .as_deref()
            .filter(|base| !base.is_empty())
            .map(|base| {
                Url::parse(base)
                    .map_err(|e| ConfigError::invalid("resolver.remote_base", e.to_string()))
            })
            .transpose()
    }

    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.remote_base_url()?;
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "resolver.fetch_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.max_validation_depth == 0 {
            return Err(ConfigError::invalid(
                "resolver.max_validation_depth",
                "must be greater than 0",
            ));
        }
        if self.max_documents == 0 {
            return Err(ConfigError::invalid(
                "resolver.max_documents",
                "must allow at least the root document",
            ));
        }
        Ok(())
    }
}

impl TryFrom<&ResolverConfig> for ResolverOptions {
    type Error = ConfigError;

    fn try_from(config: &ResolverConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            remote_base: config.remote_base_url()?,
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            max_documents: config.max_documents,
            max_validation_depth: config.max_validation_depth,
            deny_undeclared_properties: config.deny_undeclared_properties,
        })
    }
}

fn default_fetch_timeout() -> u64 {
    10_000
}

fn default_max_validation_depth() -> usize {
    128
}

fn default_max_documents() -> usize {
    64
}

fn default_deny_undeclared_properties() -> bool {
    true
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Multi-line, human readable.
    Pretty,
    /// Single-line, human readable.
    Compact,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber.
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// Filter directive (`RUST_LOG` syntax).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            format: match config.format {
                LogFormat::Json => euclid_telemetry::LogFormat::Json,
                LogFormat::Pretty => euclid_telemetry::LogFormat::Pretty,
                LogFormat::Compact => euclid_telemetry::LogFormat::Compact,
            },
            include_location: config.include_location,
            ..LogConfig::default()
        }
    }
}

fn default_logging_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

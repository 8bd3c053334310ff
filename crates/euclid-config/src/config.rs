//! Top-level configuration.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, FactoryConfig, LogFormat, LoggingConfig, ResolverConfig};

/// Complete Euclid configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use euclid_config::EuclidConfig;
///
/// let config = EuclidConfig::default();
/// assert_eq!(config.resolver.max_documents, 64);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct EuclidConfig {
    /// Router factory behaviour.
    #[serde(default)]
    pub factory: FactoryConfig,

    /// Schema resolution and validation limits.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EuclidConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EuclidConfigBuilder {
        EuclidConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.factory.build_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "factory.build_timeout_ms",
                "must be greater than 0",
            ));
        }
        self.resolver.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }
        Ok(())
    }

    /// Development preset: pretty debug logs, handler-less operations
    /// mounted so the whole contract is routable.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config.factory.mount_operations_without_handlers = true;
        config
    }

    /// Production preset: JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// Builder for [`EuclidConfig`].
#[derive(Debug, Default)]
pub struct EuclidConfigBuilder {
    config: EuclidConfig,
}

impl EuclidConfigBuilder {
    /// Set the factory section.
    #[must_use]
    pub fn factory(mut self, factory: FactoryConfig) -> Self {
        self.config.factory = factory;
        self
    }

    /// Set the resolver section.
    #[must_use]
    pub fn resolver(mut self, resolver: ResolverConfig) -> Self {
        self.config.resolver = resolver;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Build without validation.
    #[must_use]
    pub fn build(self) -> EuclidConfig {
        self.config
    }

    /// Build and validate.
    pub fn build_validated(self) -> Result<EuclidConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

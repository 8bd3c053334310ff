//! Build options.

use std::time::Duration;

use euclid_config::{ConfigError, EuclidConfig};
use euclid_schema::ResolverOptions;

/// Options fixed when a [`RouterFactory`](crate::RouterFactory) is created.
///
/// The mount and failure-handler flags are defaults; the factory setters
/// can still change them before the router is built.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use euclid_factory::FactoryOptions;
///
/// let options = FactoryOptions::default()
///     .with_build_timeout(Duration::from_secs(5))
///     .with_mount_operations_without_handlers(true);
/// assert!(options.mount_operations_without_handlers);
/// ```
#[derive(Debug, Clone)]
pub struct FactoryOptions {
    /// Mount operations without a handler; they answer 501.
    pub mount_operations_without_handlers: bool,
    /// Send failures to the failure handler instead of the built-in responses.
    pub validation_failure_handler_enabled: bool,
    /// Upper bound on loading the document and resolving its schemas.
    pub build_timeout: Duration,
    /// Reference resolution and validation limits.
    pub resolver: ResolverOptions,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            mount_operations_without_handlers: false,
            validation_failure_handler_enabled: false,
            build_timeout: Duration::from_secs(30),
            resolver: ResolverOptions::default(),
        }
    }
}

impl FactoryOptions {
    /// Sets the build timeout.
    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    /// Sets the initial mount policy.
    pub fn with_mount_operations_without_handlers(mut self, mount: bool) -> Self {
        self.mount_operations_without_handlers = mount;
        self
    }

    /// Sets the resolver options.
    pub fn with_resolver(mut self, resolver: ResolverOptions) -> Self {
        self.resolver = resolver;
        self
    }
}

impl TryFrom<&EuclidConfig> for FactoryOptions {
    type Error = ConfigError;

    fn try_from(config: &EuclidConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            mount_operations_without_handlers: config.factory.mount_operations_without_handlers,
            validation_failure_handler_enabled: config.factory.validation_failure_handler_enabled,
            build_timeout: config.factory.build_timeout(),
            resolver: ResolverOptions::try_from(&config.resolver)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid_config::ConfigLoader;

    #[test]
    fn test_from_config() {
        let config = ConfigLoader::new()
            .with_string(
                r#"
                [factory]
                validation_failure_handler_enabled = true
                build_timeout_ms = 1500

                [resolver]
                remote_base = "http://127.0.0.1:8081/"
                max_validation_depth = 12
                "#,
                "toml",
            )
            .unwrap()
            .load()
            .unwrap();

        let options = FactoryOptions::try_from(&config).unwrap();
        assert!(options.validation_failure_handler_enabled);
        assert!(!options.mount_operations_without_handlers);
        assert_eq!(options.build_timeout, Duration::from_millis(1500));
        assert_eq!(options.resolver.max_validation_depth, 12);
        assert_eq!(
            options.resolver.remote_base.map(|u| u.to_string()),
            Some("http://127.0.0.1:8081/".to_string())
        );
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        let options = FactoryOptions::try_from(&EuclidConfig::default()).unwrap();
        let defaults = FactoryOptions::default();
        assert_eq!(options.build_timeout, defaults.build_timeout);
        assert_eq!(options.resolver.max_documents, defaults.resolver.max_documents);
        assert_eq!(options.resolver.fetch_timeout, defaults.resolver.fetch_timeout);
    }
}

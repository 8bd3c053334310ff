//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{ConfigError, EuclidConfig, LogFormat};

/// Configuration loader.
///
/// Layers apply in order, later ones overriding earlier ones:
/// 1. Default values
/// 2. Configuration files and strings (TOML or JSON), merged key by key
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use euclid_config::ConfigLoader;
///
/// # fn main() -> Result<(), euclid_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("euclid.toml")?
///     .with_env_prefix("EUCLID")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: EuclidConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EuclidConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = EuclidConfig::default();
        self
    }

    /// Start from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = EuclidConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = EuclidConfig::production();
        self
    }

    /// Merge a configuration file; the format follows the extension.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match format.as_str() {
            "toml" | "json" => self.with_string(&content, &format),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merge configuration text in `format` (`toml` or `json`).
    ///
    /// ```
    /// use euclid_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[factory]\nmount_operations_without_handlers = true", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.factory.mount_operations_without_handlers);
    /// assert_eq!(config.resolver.max_documents, 64);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => {
                let table: toml::Table = toml::from_str(content)?;
                serde_json::to_value(table)?
            }
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        let mut current = serde_json::to_value(&self.config)?;
        merge(&mut current, layer);
        self.config = serde_json::from_value(current)?;
        Ok(self)
    }

    /// Apply `PREFIX__SECTION__KEY` environment overrides at load time.
    ///
    /// With prefix `EUCLID`:
    /// - `EUCLID__FACTORY__MOUNT_OPERATIONS_WITHOUT_HANDLERS=true`
    /// - `EUCLID__RESOLVER__REMOTE_BASE=http://schemas.internal/`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load variables from a `.env` file if one exists.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::invalid(".env", e.to_string())),
        }
    }

    /// Apply environment overrides and validate.
    pub fn load(mut self) -> Result<EuclidConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> EuclidConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> =
            env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
        vars.sort();
        for (key, value) in vars {
            self.apply_env_var(&key, &value, &marker)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, marker: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(marker) else {
            return Ok(());
        };
        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["FACTORY", "MOUNT_OPERATIONS_WITHOUT_HANDLERS"] => {
                config.factory.mount_operations_without_handlers = parse_bool(key, value)?;
            }
            ["FACTORY", "VALIDATION_FAILURE_HANDLER_ENABLED"] => {
                config.factory.validation_failure_handler_enabled = parse_bool(key, value)?;
            }
            ["FACTORY", "BUILD_TIMEOUT_MS"] => {
                config.factory.build_timeout_ms = parse_number(key, value)?;
            }

            ["RESOLVER", "REMOTE_BASE"] => {
                config.resolver.remote_base = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["RESOLVER", "FETCH_TIMEOUT_MS"] => {
                config.resolver.fetch_timeout_ms = parse_number(key, value)?;
            }
            ["RESOLVER", "MAX_VALIDATION_DEPTH"] => {
                config.resolver.max_validation_depth = parse_number(key, value)?;
            }
            ["RESOLVER", "MAX_DOCUMENTS"] => {
                config.resolver.max_documents = parse_number(key, value)?;
            }
            ["RESOLVER", "DENY_UNDECLARED_PROPERTIES"] => {
                config.resolver.deny_undeclared_properties = parse_bool(key, value)?;
            }

            ["LOGGING", "ENABLED"] => {
                config.logging.enabled = parse_bool(key, value)?;
            }
            ["LOGGING", "LEVEL"] => {
                config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env(
                            key,
                            "expected 'json', 'pretty' or 'compact'",
                        ))
                    }
                };
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_bool(key, value)?;
            }

            // Unknown keys are left for other consumers of the prefix.
            _ => {}
        }
        Ok(())
    }
}

/// Deep-merges `layer` into `base`; objects merge key by key, anything else
/// replaces.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env(key, "expected boolean")),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env(key, "expected integer"))
}

//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Why configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration file does not exist.
    #[error("no configuration file at {path}")]
    FileNotFound {
        /// Where the file was expected.
        path: PathBuf,
    },

    /// A configuration file exists but could not be read.
    #[error("cannot read {path}")]
    Read {
        /// The file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// TOML text did not match the configuration layout.
    #[error("bad TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON text did not match the configuration layout.
    #[error("bad JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A value parsed but is out of range or malformed.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted path of the setting, e.g. `resolver.remote_base`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An override from the environment could not be applied.
    #[error("environment override {var}: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Only `toml` and `json` are understood.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigError {
    /// Missing file.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Unreadable file.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Rejected setting.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Rejected environment override.
    pub fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

//! Error taxonomy.
//!
//! Build-time errors ([`BuildError`] and the errors it wraps) are fatal: the
//! router is not created. Request-time errors are either a
//! [`ValidationException`] or a [`HandlerError`], and the two are kept apart
//! in [`Failure`] so callers can branch on the kind.

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

use crate::ValidationException;

/// Result type alias for router construction.
pub type BuildResult<T> = Result<T, BuildError>;

/// The specification document could not be read or understood.
#[derive(Debug, Error)]
pub enum SpecLoadError {
    /// The document could not be read from disk.
    #[error("failed to read specification {source_name}: {source}")]
    Io {
        /// Path or name of the document.
        source_name: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be fetched.
    #[error("failed to fetch specification {url}: {message}")]
    Fetch {
        /// Location of the document.
        url: String,
        /// Transport error description.
        message: String,
    },

    /// The document is not valid YAML or JSON.
    #[error("failed to parse specification {source_name}: {message}")]
    Parse {
        /// Path or name of the document.
        source_name: String,
        /// Parser error description.
        message: String,
    },

    /// The document parsed but is not a usable OpenAPI 3 description.
    #[error("invalid specification at {location}: {message}")]
    Invalid {
        /// JSON pointer of the offending element.
        location: String,
        /// What is wrong with it.
        message: String,
    },
}

impl SpecLoadError {
    /// Creates a parse error.
    pub fn parse(source_name: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Creates an error for a structurally invalid document.
    pub fn invalid(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// A schema reference could not be turned into a validator node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaResolutionError {
    /// The pointer does not exist in its target document.
    #[error("unresolvable reference {reference}: {reason}")]
    Unresolvable {
        /// The `$ref` value as written.
        reference: String,
        /// Why it could not be followed.
        reason: String,
    },

    /// The document holding the target could not be fetched.
    #[error("unreachable reference {reference}: {message}")]
    Unreachable {
        /// The `$ref` value as written.
        reference: String,
        /// Transport or parse error description.
        message: String,
    },

    /// References form a loop that never reaches a concrete schema, or a
    /// composition loop that would validate forever without descending
    /// into the instance.
    #[error("cyclic reference {reference}: {chain}")]
    Cycle {
        /// The reference that closed the loop.
        reference: String,
        /// The loop, rendered as `a -> b -> a`.
        chain: String,
    },

    /// A schema keyword has an unusable value.
    #[error("invalid schema at {location}: {message}")]
    InvalidSchema {
        /// Location of the schema object.
        location: String,
        /// What is wrong with it.
        message: String,
    },

    /// More documents were referenced than the resolver allows.
    #[error("reference {reference} exceeds the limit of {limit} documents")]
    TooManyDocuments {
        /// The reference that would have loaded one document too many.
        reference: String,
        /// Configured limit.
        limit: usize,
    },
}

impl SchemaResolutionError {
    /// Creates an unresolvable reference error.
    pub fn unresolvable(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unresolvable {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unreachable reference error.
    pub fn unreachable(reference: impl Into<String>, message: impl ToString) -> Self {
        Self::Unreachable {
            reference: reference.into(),
            message: message.to_string(),
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Two operations share an `operationId`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate operationId '{operation_id}' on {first} and {second}")]
pub struct DuplicateOperationError {
    /// The repeated id.
    pub operation_id: String,
    /// `METHOD path` of the first declaration.
    pub first: String,
    /// `METHOD path` of the repeated declaration.
    pub second: String,
}

/// Router construction failed. No partial router is ever returned.
#[derive(Debug, Error)]
pub enum BuildError {
    /// See [`SpecLoadError`].
    #[error(transparent)]
    SpecLoad(#[from] SpecLoadError),

    /// See [`SchemaResolutionError`].
    #[error(transparent)]
    SchemaResolution(#[from] SchemaResolutionError),

    /// See [`DuplicateOperationError`].
    #[error(transparent)]
    DuplicateOperation(#[from] DuplicateOperationError),

    /// Two operations declare equivalent path templates with the same method.
    #[error("duplicate route: {message}")]
    DuplicateRoute {
        /// Router error description.
        message: String,
    },

    /// A handler was bound to an id the specification does not declare.
    #[error("no operation with id '{operation_id}'")]
    UnknownOperation {
        /// The unknown id.
        operation_id: String,
    },

    /// Building did not finish within the caller's time limit.
    #[error("router build timed out after {after:?}")]
    Timeout {
        /// The limit that was exceeded.
        after: Duration,
    },
}

/// A handler failed after the request passed validation.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler rejected the request with a specific status.
    #[error("{message}")]
    Failed {
        /// Response status to use.
        status: StatusCode,
        /// Human readable description.
        message: String,
    },

    /// The handler hit an unexpected error.
    #[error("internal error: {message}")]
    Internal {
        /// Human readable description.
        message: String,
        /// The underlying error, never exposed to clients.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HandlerError {
    /// Creates a failure with an explicit status.
    #[must_use]
    pub fn failed(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Failed {
            status,
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping `source`.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the response status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Failed { status, .. } => *status,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

/// A request that did not complete normally.
#[derive(Debug)]
pub enum Failure {
    /// The request violated its operation's contract.
    Validation(ValidationException),
    /// The handler failed after validation passed.
    Handler(HandlerError),
}

impl Failure {
    /// Returns `"ValidationException"` or `"HandlerError"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => ValidationException::KIND,
            Self::Handler(_) => "HandlerError",
        }
    }

    /// Returns true for validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the validation failure, if this is one.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationException> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Handler(_) => None,
        }
    }

    /// Returns the status the built-in response uses.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Handler(err) => err.status_code(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Handler(err) => write!(f, "HandlerError: {err}"),
        }
    }
}

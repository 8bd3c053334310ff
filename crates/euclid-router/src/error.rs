//! Errors raised while building a dispatch table.

use http::Method;
use thiserror::Error;

/// A route could not be added to the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The same path template and method were registered twice.
    #[error("route {method} {path} is already registered")]
    Conflict {
        /// Conflicting method.
        method: Method,
        /// Path template of the second registration.
        path: String,
    },

    /// A `*name` segment appeared before the end of the template.
    #[error("wildcard must be the last segment in {path}")]
    WildcardNotLast {
        /// Offending path template.
        path: String,
    },

    /// A segment mixes literal text with a `{param}` expression.
    #[error("unsupported segment '{segment}' in {path}")]
    InvalidSegment {
        /// Offending path template.
        path: String,
        /// The segment that could not be parsed.
        segment: String,
    },

    /// Two templates name the parameter at the same position differently.
    #[error("parameter '{found}' in {path} conflicts with '{existing}' at the same position")]
    ParamNameMismatch {
        /// Path template of the second registration.
        path: String,
        /// Name already stored in the tree.
        existing: String,
        /// Name used by the new template.
        found: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = RouteError::Conflict {
            method: Method::GET,
            path: "/pets".to_string(),
        };
        assert_eq!(err.to_string(), "route GET /pets is already registered");
    }

    #[test]
    fn test_segment_errors_display() {
        let err = RouteError::WildcardNotLast {
            path: "/files/*rest/meta".to_string(),
        };
        assert_eq!(err.to_string(), "wildcard must be the last segment in /files/*rest/meta");

        let err = RouteError::InvalidSegment {
            path: "/pets/v{id}".to_string(),
            segment: "v{id}".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported segment 'v{id}' in /pets/v{id}");
        let source: &dyn std::error::Error = &err;
        assert!(source.source().is_none());
    }

    #[test]
    fn test_param_mismatch_display() {
        let err = RouteError::ParamNameMismatch {
            path: "/pets/{name}".to_string(),
            existing: "id".to_string(),
            found: "name".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "parameter 'name' in /pets/{name} conflicts with 'id' at the same position"
        );
    }
}

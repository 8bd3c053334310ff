//! Per-request validation failures.
//!
//! A [`ValidationException`] is produced for the first constraint a request
//! violates. It is recoverable: the router hands it to the configured failure
//! handler and never lets it escape as a fault.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// The kind of constraint that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorType {
    /// The value has the wrong JSON type.
    TypeMismatch,
    /// A required property is absent.
    MissingRequired,
    /// A property is not allowed by `additionalProperties`.
    AdditionalProperty,
    /// A numeric bound or `multipleOf` is violated.
    Bound,
    /// A string, array or object size bound is violated.
    Length,
    /// A string does not match its `pattern`.
    Pattern,
    /// The value is not one of the `enum` or `const` values.
    Enum,
    /// A string does not satisfy its `format`.
    Format,
    /// Array items are not unique.
    Uniqueness,
    /// No alternative of `oneOf`/`anyOf` matched, or `not` matched.
    NoMatch,
    /// More than one `oneOf` alternative matched.
    AmbiguousMatch,
    /// A required request body is missing.
    MissingBody,
    /// The request body is not valid JSON.
    BodyParse,
    /// The request body has an unsupported media type.
    UnsupportedMediaType,
    /// A path, query or header parameter is missing or malformed.
    Parameter,
    /// The instance nests deeper than the validator allows.
    DepthExceeded,
    /// The schema still contains a reference that was never resolved.
    UnresolvedReference,
}

impl ValidationErrorType {
    /// Returns the snake_case name used in the serialised form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TypeMismatch => "type_mismatch",
            Self::MissingRequired => "missing_required",
            Self::AdditionalProperty => "additional_property",
            Self::Bound => "bound",
            Self::Length => "length",
            Self::Pattern => "pattern",
            Self::Enum => "enum",
            Self::Format => "format",
            Self::Uniqueness => "uniqueness",
            Self::NoMatch => "no_match",
            Self::AmbiguousMatch => "ambiguous_match",
            Self::MissingBody => "missing_body",
            Self::BodyParse => "body_parse",
            Self::UnsupportedMediaType => "unsupported_media_type",
            Self::Parameter => "parameter",
            Self::DepthExceeded => "depth_exceeded",
            Self::UnresolvedReference => "unresolved_reference",
        }
    }
}

impl std::fmt::Display for ValidationErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request failed validation against its operation.
///
/// Serialises as:
///
/// ```json
/// {"kind":"ValidationException","errorType":"missing_required","message":"missing required property 'age'","path":"$"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ValidationException: {message} (at {path})")]
pub struct ValidationException {
    error_type: ValidationErrorType,
    message: String,
    path: String,
}

impl ValidationException {
    /// Value of the `kind` field in the serialised form.
    pub const KIND: &'static str = "ValidationException";

    /// Creates an exception for the value at `path`.
    #[must_use]
    pub fn new(
        error_type: ValidationErrorType,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            message: message.into(),
            path: path.into(),
        }
    }

    /// Returns the violated constraint kind.
    #[must_use]
    pub const fn error_type(&self) -> ValidationErrorType {
        self.error_type
    }

    /// Returns the human readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the location of the failing value, such as `$.address.city`
    /// or `query.limit`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the serialised JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": Self::KIND,
            "errorType": self.error_type,
            "message": self.message,
            "path": self.path,
        })
    }
}

impl Serialize for ValidationException {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationException", 4)?;
        state.serialize_field("kind", Self::KIND)?;
        state.serialize_field("errorType", &self.error_type)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("path", &self.path)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let err = ValidationException::new(
            ValidationErrorType::Bound,
            "$.age",
            "value -1 is less than minimum 0",
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "ValidationException");
        assert_eq!(json["errorType"], "bound");
        assert_eq!(json["path"], "$.age");
        assert_eq!(json["message"], "value -1 is less than minimum 0");
        assert_eq!(json, err.to_json());
    }

    #[test]
    fn test_display_mentions_path() {
        let err = ValidationException::new(
            ValidationErrorType::MissingRequired,
            "$",
            "missing required property 'age'",
        );
        assert_eq!(
            err.to_string(),
            "ValidationException: missing required property 'age' (at $)"
        );
    }

    #[test]
    fn test_error_type_names_match_serde() {
        for kind in [
            ValidationErrorType::AmbiguousMatch,
            ValidationErrorType::UnsupportedMediaType,
            ValidationErrorType::DepthExceeded,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
        assert_eq!(ValidationErrorType::NoMatch.to_string(), "no_match");
    }
}

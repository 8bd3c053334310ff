//! Operation model.
//!
//! Operations refer to their schemas by JSON pointer into the specification
//! document. The pointers are handed to the schema resolver once, at build
//! time, and exchanged for [`SchemaId`](euclid_schema::SchemaId)s.

use std::fmt;

use http::Method;

/// Where a parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    /// A `{name}` segment of the path template.
    Path,
    /// The query string.
    Query,
    /// A request header.
    Header,
    /// A cookie. Declared cookies are recorded but not validated.
    Cookie,
}

impl ParameterLocation {
    /// Parses the `in` field of a parameter object.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    /// Returns the `in` spelling, also used as the root of error paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name. Header names are matched case-insensitively.
    pub name: String,
    /// Where the value comes from.
    pub location: ParameterLocation,
    /// A missing value fails validation. Always true for path parameters.
    pub required: bool,
    /// Pointer to the parameter schema, if any.
    pub schema: Option<String>,
}

impl Parameter {
    /// Renders `location.name`, the prefix of every error path for this
    /// parameter.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.location, self.name)
    }
}

/// A declared request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    /// An empty body fails validation.
    pub required: bool,
    /// Media types listed under `content`, in declaration order.
    pub content_types: Vec<String>,
    /// Pointer to the schema of the JSON media type, if one is declared.
    pub schema: Option<String>,
}

impl RequestBody {
    /// Returns true if a request with `content_type` may carry this body.
    #[must_use]
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = media_essence(content_type);
        self.content_types.iter().any(|declared| {
            let declared = media_essence(declared);
            declared == essence
                || declared == "*/*"
                || (is_json(&declared) && is_json(&essence))
                || declared
                    .strip_suffix("/*")
                    .is_some_and(|kind| essence.split('/').next() == Some(kind))
        })
    }
}

/// Lowercased media type without parameters.
pub(crate) fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// `application/json` or any `+json` media type.
pub(crate) fn is_json(essence: &str) -> bool {
    essence == "application/json" || essence.ends_with("+json")
}

/// One operation of the specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The `operationId`.
    pub id: String,
    /// HTTP method.
    pub method: Method,
    /// Path template, e.g. `/pets/{petId}`.
    pub path: String,
    /// Pointer to the operation object in the document.
    pub pointer: String,
    /// `summary`, if present.
    pub summary: Option<String>,
    /// `tags`, in order.
    pub tags: Vec<String>,
    /// `deprecated`.
    pub deprecated: bool,
    /// Path-level parameters merged with the operation's own.
    pub parameters: Vec<Parameter>,
    /// The request body, if declared.
    pub request_body: Option<RequestBody>,
}

impl Operation {
    /// Renders `METHOD path`.
    #[must_use]
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(types: &[&str]) -> RequestBody {
        RequestBody {
            required: true,
            content_types: types.iter().map(ToString::to_string).collect(),
            schema: None,
        }
    }

    #[test]
    fn test_accepts_json_family() {
        let json = body(&["application/json"]);
        assert!(json.accepts("application/json; charset=utf-8"));
        assert!(json.accepts("Application/JSON"));
        assert!(json.accepts("application/merge-patch+json"));
        assert!(!json.accepts("text/plain"));
    }

    #[test]
    fn test_accepts_wildcards() {
        assert!(body(&["*/*"]).accepts("text/csv"));
        assert!(body(&["text/*"]).accepts("text/csv"));
        assert!(!body(&["text/*"]).accepts("application/json"));
    }

    #[test]
    fn test_parameter_label() {
        let param = Parameter {
            name: "limit".to_string(),
            location: ParameterLocation::Query,
            required: false,
            schema: None,
        };
        assert_eq!(param.label(), "query.limit");
        assert_eq!(ParameterLocation::parse("header"), Some(ParameterLocation::Header));
        assert_eq!(ParameterLocation::parse("body"), None);
    }
}

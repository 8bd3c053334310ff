//! Request validation.
//!
//! Parameters arrive as strings. Each is coerced to the JSON type its schema
//! expects before schema validation, so `?limit=10` validates against
//! `type: integer`. Checks run in a fixed order: path, query, header, body.

use bytes::Bytes;
use euclid_core::{ValidationErrorType, ValidationException};
use euclid_router::Params;
use euclid_schema::{SchemaId, SchemaSet, ValueShape};
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde_json::{Number, Value};

use crate::operation::{Operation, Parameter, ParameterLocation};
use crate::spec::OperationSchemas;

/// The raw parts of a request that validation looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    /// Parameters captured from the path template.
    pub params: &'a Params,
    /// Decoded query pairs, in order.
    pub query: &'a [(String, String)],
    /// Request headers.
    pub headers: &'a HeaderMap,
    /// Raw body.
    pub body: &'a Bytes,
}

/// Validates a request against an operation.
///
/// Returns the parsed JSON body, if the operation declares a JSON body and
/// the request carries one.
pub fn validate_request(
    operation: &Operation,
    compiled: &OperationSchemas,
    schemas: &SchemaSet,
    parts: RequestParts<'_>,
) -> Result<Option<Value>, ValidationException> {
    for location in [ParameterLocation::Path, ParameterLocation::Query, ParameterLocation::Header] {
        for (index, parameter) in operation.parameters.iter().enumerate() {
            if parameter.location == location {
                let schema = compiled.parameters.get(index).copied().flatten();
                validate_parameter(parameter, schema, schemas, parts)?;
            }
        }
    }
    validate_body(operation, compiled.body, schemas, parts)
}

fn raw_values<'a>(parameter: &Parameter, parts: RequestParts<'a>) -> Vec<&'a str> {
    match parameter.location {
        ParameterLocation::Path => parts.params.get(&parameter.name).into_iter().collect(),
        ParameterLocation::Query => parts
            .query
            .iter()
            .filter(|(name, _)| *name == parameter.name)
            .map(|(_, value)| value.as_str())
            .collect(),
        ParameterLocation::Header => parts
            .headers
            .get_all(parameter.name.as_str())
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect(),
        ParameterLocation::Cookie => Vec::new(),
    }
}

fn validate_parameter(
    parameter: &Parameter,
    schema: Option<SchemaId>,
    schemas: &SchemaSet,
    parts: RequestParts<'_>,
) -> Result<(), ValidationException> {
    let label = parameter.label();
    let raw = raw_values(parameter, parts);
    if raw.is_empty() {
        if parameter.required {
            return Err(ValidationException::new(
                ValidationErrorType::Parameter,
                label,
                format!("missing required {} parameter '{}'", parameter.location, parameter.name),
            ));
        }
        return Ok(());
    }

    let Some(schema) = schema else {
        return Ok(());
    };
    let value = coerce(&raw, schemas.shape(schema), schemas)
        .map_err(|message| ValidationException::new(ValidationErrorType::Parameter, &label, message))?;
    schemas.validate_at(schema, &value, &label)
}

/// Converts raw parameter strings into the JSON value `shape` expects.
///
/// Arrays accept repeated values (`?tag=a&tag=b`) or one comma-separated
/// value (`?tag=a,b`).
pub fn coerce(raw: &[&str], shape: ValueShape, schemas: &SchemaSet) -> Result<Value, String> {
    if let ValueShape::Array(items) = shape {
        let item_shape = items.map_or(ValueShape::Any, |id| schemas.shape(id));
        let pieces: Vec<&str> = match raw {
            [single] if single.is_empty() => Vec::new(),
            [single] => single.split(',').collect(),
            many => many.to_vec(),
        };
        return pieces
            .into_iter()
            .map(|piece| coerce_scalar(piece, item_shape))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array);
    }
    let first = raw.first().copied().unwrap_or_default();
    coerce_scalar(first, shape)
}

fn coerce_scalar(raw: &str, shape: ValueShape) -> Result<Value, String> {
    match shape {
        ValueShape::Integer | ValueShape::Number => serde_json::from_str::<Number>(raw.trim())
            .map(Value::Number)
            .map_err(|_| {
                let expected = if shape == ValueShape::Integer { "integer" } else { "number" };
                format!("expected {expected}, got '{raw}'")
            }),
        ValueShape::Boolean => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("expected boolean, got '{raw}'")),
        },
        ValueShape::Null if raw.is_empty() || raw == "null" => Ok(Value::Null),
        ValueShape::Null => Err(format!("expected null, got '{raw}'")),
        ValueShape::Object => serde_json::from_str::<Value>(raw)
            .ok()
            .filter(Value::is_object)
            .ok_or_else(|| format!("expected a JSON object, got '{raw}'")),
        ValueShape::String | ValueShape::Any | ValueShape::Array(_) => {
            Ok(Value::String(raw.to_string()))
        }
    }
}

fn validate_body(
    operation: &Operation,
    schema: Option<SchemaId>,
    schemas: &SchemaSet,
    parts: RequestParts<'_>,
) -> Result<Option<Value>, ValidationException> {
    let Some(declared) = &operation.request_body else {
        return Ok(None);
    };

    if parts.body.is_empty() {
        if declared.required {
            return Err(ValidationException::new(
                ValidationErrorType::MissingBody,
                "$",
                "request body is required",
            ));
        }
        return Ok(None);
    }

    if let Some(content_type) = parts.headers.get(CONTENT_TYPE) {
        let content_type = content_type.to_str().unwrap_or_default();
        if !declared.accepts(content_type) {
            return Err(ValidationException::new(
                ValidationErrorType::UnsupportedMediaType,
                "$",
                format!("unsupported media type '{content_type}'"),
            ));
        }
        if !crate::operation::is_json(&crate::operation::media_essence(content_type)) {
            return Ok(None);
        }
    }

    let Some(schema) = schema else {
        return Ok(serde_json::from_slice(parts.body).ok());
    };
    let value: Value = serde_json::from_slice(parts.body).map_err(|e| {
        ValidationException::new(
            ValidationErrorType::BodyParse,
            "$",
            format!("request body is not valid JSON: {e}"),
        )
    })?;
    schemas.validate(schema, &value)?;
    Ok(Some(value))
}

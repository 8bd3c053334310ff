//! Instance validation against a compiled [`SchemaArena`].
//!
//! Validation is read-only: a [`SchemaSet`] can be shared between threads and
//! checked concurrently. The first violated constraint is reported with a
//! path such as `$.items[2].name`.

use std::fmt::Write as _;
use std::sync::Arc;

use euclid_core::{ValidationErrorType, ValidationException};
use serde_json::{Number, Value};

use crate::model::{
    AdditionalProperties, ArraySchema, Bound, Combinator, CombinatorKind, ObjectSchema,
    PrimitiveSchema, PrimitiveType, SchemaArena, SchemaId, SchemaKind, ValueShape,
};
use crate::numeric::{numbers_equal, Decimal};

/// Outcome of a validation.
pub type ValidationResult = Result<(), ValidationException>;

/// A compiled, immutable set of schemas.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    arena: Arc<SchemaArena>,
    max_depth: usize,
}

impl SchemaSet {
    /// Wraps an arena. `max_depth` bounds how deep instances may nest.
    #[must_use]
    pub fn new(arena: SchemaArena, max_depth: usize) -> Self {
        Self {
            arena: Arc::new(arena),
            max_depth,
        }
    }

    /// Returns the underlying arena.
    #[must_use]
    pub fn arena(&self) -> &SchemaArena {
        &self.arena
    }

    /// Returns the nesting limit.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the shape the schema expects.
    #[must_use]
    pub fn shape(&self, id: SchemaId) -> ValueShape {
        self.arena.shape(id)
    }

    /// Validates `value` against schema `id`. Paths start at `$`.
    pub fn validate(&self, id: SchemaId, value: &Value) -> ValidationResult {
        self.validate_at(id, value, "$")
    }

    /// Validates `value`, rendering paths from `root` instead of `$`.
    pub fn validate_at(&self, id: SchemaId, value: &Value, root: &str) -> ValidationResult {
        let mut validator = Validator {
            arena: &self.arena,
            max_depth: self.max_depth,
            root,
            path: Vec::new(),
        };
        validator.check(id, value, None)
    }
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Property names an enclosing `allOf` declares, chained outward.
struct Extras<'a> {
    names: &'a [String],
    parent: Option<&'a Extras<'a>>,
}

impl Extras<'_> {
    fn allows(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name) || self.parent.is_some_and(|p| p.allows(name))
    }
}

struct Validator<'a> {
    arena: &'a SchemaArena,
    max_depth: usize,
    root: &'a str,
    path: Vec<Segment<'a>>,
}

impl<'a> Validator<'a> {
    fn render_path(&self) -> String {
        let mut out = self.root.to_string();
        for segment in &self.path {
            match segment {
                Segment::Key(key) if is_identifier(key) => {
                    let _ = write!(out, ".{key}");
                }
                Segment::Key(key) => {
                    let _ = write!(out, "['{}']", key.replace('\'', "\\'"));
                }
                Segment::Index(index) => {
                    let _ = write!(out, "[{index}]");
                }
            }
        }
        out
    }

    fn fail(&self, error_type: ValidationErrorType, message: impl Into<String>) -> ValidationException {
        ValidationException::new(error_type, self.render_path(), message)
    }

    fn descend(&mut self, segment: Segment<'a>, id: SchemaId, value: &'a Value) -> ValidationResult {
        if self.path.len() >= self.max_depth {
            return Err(self.fail(
                ValidationErrorType::DepthExceeded,
                format!("value nests deeper than {} levels", self.max_depth),
            ));
        }
        self.path.push(segment);
        let result = self.check(id, value, None);
        self.path.pop();
        result
    }

    fn check(&mut self, id: SchemaId, value: &'a Value, extras: Option<&Extras<'_>>) -> ValidationResult {
        let arena = self.arena;
        let node = arena.get(id);
        if node.nullable && value.is_null() {
            return Ok(());
        }

        match &node.kind {
            SchemaKind::Any => {}
            SchemaKind::Never => {
                return Err(self.fail(ValidationErrorType::TypeMismatch, "no value is allowed here"));
            }
            SchemaKind::Primitive(primitive) => self.primitive(primitive, value)?,
            SchemaKind::Object(object) => self.object(object, value, extras)?,
            SchemaKind::Array(array) => self.array(array, value)?,
            SchemaKind::Combinator(combinator) => self.combinator(combinator, value, extras)?,
            SchemaKind::Not(child) => {
                if self.check(*child, value, extras).is_ok() {
                    return Err(self.fail(
                        ValidationErrorType::NoMatch,
                        "value must not match the 'not' schema",
                    ));
                }
            }
            SchemaKind::Reference(reference) => {
                return Err(self.fail(
                    ValidationErrorType::UnresolvedReference,
                    format!("reference '{reference}' was never resolved"),
                ));
            }
        }

        if let Some(enumeration) = &node.enumeration {
            if !enumeration.values.iter().any(|allowed| json_equal(allowed, value)) {
                let message = match enumeration.values.as_slice() {
                    [only] if enumeration.is_const => {
                        format!("value {} does not equal the constant {only}", render(value))
                    }
                    _ => format!("value {} is not one of the allowed values", render(value)),
                };
                return Err(self.fail(ValidationErrorType::Enum, message));
            }
        }
        Ok(())
    }

    fn primitive(&self, schema: &PrimitiveSchema, value: &Value) -> ValidationResult {
        if !schema.types.is_empty() && !schema.types.iter().any(|t| type_matches(*t, value)) {
            let expected: Vec<&str> = schema.types.iter().map(|t| t.name()).collect();
            return Err(self.fail(
                ValidationErrorType::TypeMismatch,
                format!("expected {}, got {}", expected.join(" or "), type_name(value)),
            ));
        }

        match value {
            Value::Number(number) => self.number(schema, number),
            Value::String(text) => self.string(schema, text),
            _ => Ok(()),
        }
    }

    fn number(&self, schema: &PrimitiveSchema, number: &Number) -> ValidationResult {
        let Some(value) = Decimal::from_number(number) else {
            return Err(self.fail(
                ValidationErrorType::Bound,
                format!("value {number} is not a decimal number"),
            ));
        };

        if let Some(Bound { value: min, text, exclusive }) = &schema.minimum {
            if *exclusive && value <= *min {
                return Err(self.fail(
                    ValidationErrorType::Bound,
                    format!("value {number} is not greater than exclusive minimum {text}"),
                ));
            }
            if value < *min {
                return Err(self.fail(
                    ValidationErrorType::Bound,
                    format!("value {number} is less than minimum {text}"),
                ));
            }
        }
        if let Some(Bound { value: max, text, exclusive }) = &schema.maximum {
            if *exclusive && value >= *max {
                return Err(self.fail(
                    ValidationErrorType::Bound,
                    format!("value {number} is not less than exclusive maximum {text}"),
                ));
            }
            if value > *max {
                return Err(self.fail(
                    ValidationErrorType::Bound,
                    format!("value {number} is greater than maximum {text}"),
                ));
            }
        }
        if let Some((divisor, text)) = &schema.multiple_of {
            let multiple = value
                .is_multiple_of(divisor)
                .unwrap_or_else(|| approximately_multiple(&value, divisor));
            if !multiple {
                return Err(self.fail(
                    ValidationErrorType::Bound,
                    format!("value {number} is not a multiple of {text}"),
                ));
            }
        }
        if let Some(format) = &schema.format {
            if !format.check_number(number) {
                return Err(self.fail(
                    ValidationErrorType::Format,
                    format!("value {number} is not a valid {}", format.name()),
                ));
            }
        }
        Ok(())
    }

    fn string(&self, schema: &PrimitiveSchema, text: &str) -> ValidationResult {
        let length = text.chars().count() as u64;
        if let Some(min) = schema.min_length {
            if length < min {
                return Err(self.fail(
                    ValidationErrorType::Length,
                    format!("string length {length} is less than minLength {min}"),
                ));
            }
        }
        if let Some(max) = schema.max_length {
            if length > max {
                return Err(self.fail(
                    ValidationErrorType::Length,
                    format!("string length {length} is greater than maxLength {max}"),
                ));
            }
        }
        if let Some(pattern) = &schema.pattern {
            if !pattern.regex.is_match(text) {
                return Err(self.fail(
                    ValidationErrorType::Pattern,
                    format!("string '{text}' does not match pattern '{}'", pattern.source),
                ));
            }
        }
        if let Some(format) = &schema.format {
            if !format.check_str(text) {
                return Err(self.fail(
                    ValidationErrorType::Format,
                    format!("string '{text}' is not a valid {}", format.name()),
                ));
            }
        }
        Ok(())
    }

    fn object(
        &mut self,
        schema: &'a ObjectSchema,
        value: &'a Value,
        extras: Option<&Extras<'_>>,
    ) -> ValidationResult {
        let Value::Object(map) = value else {
            if schema.require_type {
                return Err(self.fail(
                    ValidationErrorType::TypeMismatch,
                    format!("expected object, got {}", type_name(value)),
                ));
            }
            return Ok(());
        };

        for name in &schema.required {
            if !map.contains_key(name) {
                self.path.push(Segment::Key(name));
                let err = self.fail(
                    ValidationErrorType::MissingRequired,
                    format!("missing required property '{name}'"),
                );
                self.path.pop();
                return Err(err);
            }
        }

        for (name, child) in &schema.properties {
            if let Some(property) = map.get(name) {
                self.descend(Segment::Key(name), *child, property)?;
            }
        }

        for (name, property) in map {
            if schema.properties.contains_key(name) {
                continue;
            }
            let allowed = match schema.additional {
                AdditionalProperties::Allow => true,
                AdditionalProperties::Deny => false,
                AdditionalProperties::Sealed => extras.is_some_and(|e| e.allows(name)),
                AdditionalProperties::Schema(id) => {
                    self.descend(Segment::Key(name), id, property)?;
                    true
                }
            };
            if !allowed {
                self.path.push(Segment::Key(name));
                let err = self.fail(
                    ValidationErrorType::AdditionalProperty,
                    format!("property '{name}' is not allowed"),
                );
                self.path.pop();
                return Err(err);
            }
        }

        let count = map.len() as u64;
        if let Some(min) = schema.min_properties {
            if count < min {
                return Err(self.fail(
                    ValidationErrorType::Length,
                    format!("object has {count} properties, fewer than minProperties {min}"),
                ));
            }
        }
        if let Some(max) = schema.max_properties {
            if count > max {
                return Err(self.fail(
                    ValidationErrorType::Length,
                    format!("object has {count} properties, more than maxProperties {max}"),
                ));
            }
        }
        Ok(())
    }

    fn array(&mut self, schema: &ArraySchema, value: &'a Value) -> ValidationResult {
        let Value::Array(items) = value else {
            if schema.require_type {
                return Err(self.fail(
                    ValidationErrorType::TypeMismatch,
                    format!("expected array, got {}", type_name(value)),
                ));
            }
            return Ok(());
        };

        let count = items.len() as u64;
        if let Some(min) = schema.min_items {
            if count < min {
                return Err(self.fail(
                    ValidationErrorType::Length,
                    format!("array has {count} items, fewer than minItems {min}"),
                ));
            }
        }
        if let Some(max) = schema.max_items {
            if count > max {
                return Err(self.fail(
                    ValidationErrorType::Length,
                    format!("array has {count} items, more than maxItems {max}"),
                ));
            }
        }

        if let Some(item_schema) = schema.items {
            for (index, item) in items.iter().enumerate() {
                self.descend(Segment::Index(index), item_schema, item)?;
            }
        }

        if schema.unique_items {
            for (i, a) in items.iter().enumerate() {
                if let Some(j) = items[i + 1..].iter().position(|b| json_equal(a, b)) {
                    return Err(self.fail(
                        ValidationErrorType::Uniqueness,
                        format!("array items {i} and {} are equal", i + 1 + j),
                    ));
                }
            }
        }
        Ok(())
    }

    fn combinator(
        &mut self,
        combinator: &'a Combinator,
        value: &'a Value,
        extras: Option<&Extras<'_>>,
    ) -> ValidationResult {
        match combinator.kind {
            CombinatorKind::AllOf => {
                let scope = Extras {
                    names: &combinator.declared,
                    parent: extras,
                };
                for child in &combinator.children {
                    self.check(*child, value, Some(&scope))?;
                }
                Ok(())
            }
            CombinatorKind::AnyOf | CombinatorKind::OneOf => {
                let mut matched = Vec::new();
                let mut failures = Vec::new();
                for (index, child) in combinator.children.iter().enumerate() {
                    match self.check(*child, value, extras) {
                        Ok(()) if combinator.kind == CombinatorKind::AnyOf => return Ok(()),
                        Ok(()) => matched.push(index),
                        Err(err) => failures.push(format!("[{index}] {} at {}", err.message(), err.path())),
                    }
                }
                match matched.len() {
                    1 => Ok(()),
                    0 => Err(self.fail(
                        ValidationErrorType::NoMatch,
                        format!(
                            "value does not match any {} alternative: {}",
                            combinator.kind.keyword(),
                            failures.join("; ")
                        ),
                    )),
                    _ => {
                        let indices: Vec<String> = matched.iter().map(ToString::to_string).collect();
                        Err(self.fail(
                            ValidationErrorType::AmbiguousMatch,
                            format!(
                                "value matches more than one oneOf alternative: [{}]",
                                indices.join(", ")
                            ),
                        ))
                    }
                }
            }
        }
    }
}

/// Float fallback for `multipleOf` operands too large to align exactly.
/// Values that do not survive the conversion are rejected.
fn approximately_multiple(value: &Decimal, divisor: &Decimal) -> bool {
    let (value_f, divisor_f) = (value.to_f64(), divisor.to_f64());
    if !value_f.is_finite() || !divisor_f.is_finite() || divisor_f == 0.0 {
        return false;
    }
    if value_f == 0.0 && !value.is_zero() {
        return false;
    }
    let quotient = value_f / divisor_f;
    quotient.is_finite() && (quotient - quotient.round()).abs() < 1e-9
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn type_matches(expected: PrimitiveType, value: &Value) -> bool {
    match (expected, value) {
        (PrimitiveType::String, Value::String(_))
        | (PrimitiveType::Number, Value::Number(_))
        | (PrimitiveType::Boolean, Value::Bool(_))
        | (PrimitiveType::Null, Value::Null) => true,
        (PrimitiveType::Integer, Value::Number(n)) => {
            Decimal::from_number(n).is_some_and(|d| d.is_integer())
        }
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render(value: &Value) -> String {
    value.to_string()
}

/// JSON equality with numbers compared by value, so `1.0` equals `1`.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| json_equal(v, w)))
        }
        _ => a == b,
    }
}

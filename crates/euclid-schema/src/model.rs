//! Schema node arena.
//!
//! Resolved schemas live in a [`SchemaArena`] and refer to each other by
//! [`SchemaId`]. A self-referential structure (a tree node whose `children`
//! are tree nodes) is a node whose descendants point back at its own id, so
//! cycles need no shared ownership and are never expanded.

use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::format::Format;
use crate::numeric::Decimal;

/// Index of a node in a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(pub(crate) usize);

impl SchemaId {
    /// Returns the arena slot.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// JSON types a primitive schema can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `"string"`
    String,
    /// `"number"`
    Number,
    /// `"integer"`, any number without a fractional part.
    Integer,
    /// `"boolean"`
    Boolean,
    /// `"null"`
    Null,
}

impl PrimitiveType {
    /// Returns the keyword spelling.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }
}

/// A numeric bound and whether the bound value itself is excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    /// The bound.
    pub value: Decimal,
    /// The literal as written, for messages.
    pub text: String,
    /// True for `exclusiveMinimum`/`exclusiveMaximum`.
    pub exclusive: bool,
}

/// A compiled `pattern`.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The expression as written.
    pub source: String,
    /// Compiled, unanchored.
    pub regex: Regex,
}

/// Scalar constraints. Each group applies only to instances of its own type.
#[derive(Debug, Clone, Default)]
pub struct PrimitiveSchema {
    /// Accepted types; empty accepts every type.
    pub types: Vec<PrimitiveType>,
    /// Lower bound for numbers.
    pub minimum: Option<Bound>,
    /// Upper bound for numbers.
    pub maximum: Option<Bound>,
    /// Required divisor for numbers, with its literal.
    pub multiple_of: Option<(Decimal, String)>,
    /// Minimum length of strings, in characters.
    pub min_length: Option<u64>,
    /// Maximum length of strings, in characters.
    pub max_length: Option<u64>,
    /// Pattern strings must contain a match for.
    pub pattern: Option<Pattern>,
    /// Format check.
    pub format: Option<Format>,
}

/// What an object does with properties it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionalProperties {
    /// Any extra property is accepted.
    Allow,
    /// `additionalProperties: false`: no extra property is accepted.
    Deny,
    /// No policy was written. Extra properties are rejected unless an
    /// enclosing `allOf` declares them in another branch.
    Sealed,
    /// Extra properties must match the schema.
    Schema(SchemaId),
}

/// Object constraints.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    /// When false, non-object instances skip these checks.
    pub require_type: bool,
    /// Declared properties in document order.
    pub properties: IndexMap<String, SchemaId>,
    /// Required property names in document order.
    pub required: Vec<String>,
    /// Policy for undeclared properties.
    pub additional: AdditionalProperties,
    /// Minimum number of properties.
    pub min_properties: Option<u64>,
    /// Maximum number of properties.
    pub max_properties: Option<u64>,
}

/// Array constraints.
#[derive(Debug, Clone)]
pub struct ArraySchema {
    /// When false, non-array instances skip these checks.
    pub require_type: bool,
    /// Schema every item must match; `None` accepts any item.
    pub items: Option<SchemaId>,
    /// Minimum item count.
    pub min_items: Option<u64>,
    /// Maximum item count.
    pub max_items: Option<u64>,
    /// Items must be pairwise distinct.
    pub unique_items: bool,
}

/// How combinator children combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorKind {
    /// `allOf`: every child must match.
    AllOf,
    /// `anyOf`: at least one child must match.
    AnyOf,
    /// `oneOf`: exactly one child must match.
    OneOf,
}

impl CombinatorKind {
    /// Returns the keyword spelling.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::AllOf => "allOf",
            Self::AnyOf => "anyOf",
            Self::OneOf => "oneOf",
        }
    }
}

/// A logical composition of child schemas.
#[derive(Debug, Clone)]
pub struct Combinator {
    /// Composition rule.
    pub kind: CombinatorKind,
    /// Children in document order.
    pub children: Vec<SchemaId>,
    /// For `allOf`, the properties declared anywhere in the composition;
    /// sealed objects inside it accept these.
    pub declared: Vec<String>,
}

/// Variant of a [`SchemaNode`].
#[derive(Debug, Clone)]
pub enum SchemaKind {
    /// Accepts everything (`true`, `{}`).
    Any,
    /// Rejects everything (`false`).
    Never,
    /// Scalar constraints.
    Primitive(PrimitiveSchema),
    /// Object constraints.
    Object(ObjectSchema),
    /// Array constraints.
    Array(ArraySchema),
    /// `allOf`, `anyOf` or `oneOf`.
    Combinator(Combinator),
    /// `not`.
    Not(SchemaId),
    /// A reference that was never resolved. Only exists while building;
    /// the validator refuses to evaluate it.
    Reference(String),
}

/// Allowed values from `enum` or `const`.
#[derive(Debug, Clone)]
pub struct Enumeration {
    /// Allowed values.
    pub values: Vec<Value>,
    /// True when written as `const`.
    pub is_const: bool,
}

/// One resolved schema.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// Variant and its constraints.
    pub kind: SchemaKind,
    /// `null` is accepted regardless of the other constraints.
    pub nullable: bool,
    /// `enum` or `const`, checked after the variant's own constraints.
    pub enumeration: Option<Enumeration>,
    /// Where the schema was defined, as `document#pointer`.
    pub location: String,
}

impl SchemaNode {
    /// Creates a node with no common attributes.
    #[must_use]
    pub fn new(kind: SchemaKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            nullable: false,
            enumeration: None,
            location: location.into(),
        }
    }
}

/// The broad JSON shape a schema expects, used to coerce parameter strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// No single type is implied.
    Any,
    /// `boolean`
    Boolean,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `string`
    String,
    /// `null`
    Null,
    /// `array`, with the item schema if any.
    Array(Option<SchemaId>),
    /// `object`
    Object,
}

/// Storage for resolved schema nodes.
#[derive(Debug, Clone, Default)]
pub struct SchemaArena {
    nodes: Vec<SchemaNode>,
}

impl SchemaArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its id.
    pub fn push(&mut self, node: SchemaNode) -> SchemaId {
        self.nodes.push(node);
        SchemaId(self.nodes.len() - 1)
    }

    /// Reserves a slot for a node whose children may refer back to it.
    pub(crate) fn reserve(&mut self, reference: &str) -> SchemaId {
        self.push(SchemaNode::new(
            SchemaKind::Reference(reference.to_string()),
            reference,
        ))
    }

    /// Fills a reserved slot.
    pub(crate) fn set(&mut self, id: SchemaId, node: SchemaNode) {
        self.nodes[id.0] = node;
    }

    pub(crate) fn get_mut(&mut self, id: SchemaId) -> &mut SchemaNode {
        &mut self.nodes[id.0]
    }

    /// Returns a node. Ids are only handed out by this arena.
    #[must_use]
    pub fn get(&self, id: SchemaId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over `(id, node)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &SchemaNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (SchemaId(i), n))
    }

    /// Ids of children validated against the same instance as their parent.
    pub(crate) fn in_place_children(&self, id: SchemaId) -> Vec<SchemaId> {
        match &self.get(id).kind {
            SchemaKind::Combinator(c) => c.children.clone(),
            SchemaKind::Not(child) => vec![*child],
            _ => Vec::new(),
        }
    }

    /// Returns the shape a schema expects, looking through `allOf`.
    #[must_use]
    pub fn shape(&self, id: SchemaId) -> ValueShape {
        self.shape_bounded(id, 16)
    }

    fn shape_bounded(&self, id: SchemaId, budget: u8) -> ValueShape {
        if budget == 0 {
            return ValueShape::Any;
        }
        match &self.get(id).kind {
            SchemaKind::Primitive(p) => match p.types.as_slice() {
                [PrimitiveType::String] => ValueShape::String,
                [PrimitiveType::Integer] => ValueShape::Integer,
                [PrimitiveType::Number] => ValueShape::Number,
                [PrimitiveType::Boolean] => ValueShape::Boolean,
                [PrimitiveType::Null] => ValueShape::Null,
                _ => ValueShape::Any,
            },
            SchemaKind::Object(o) if o.require_type => ValueShape::Object,
            SchemaKind::Array(a) if a.require_type => ValueShape::Array(a.items),
            SchemaKind::Combinator(c) if c.kind == CombinatorKind::AllOf => c
                .children
                .iter()
                .map(|child| self.shape_bounded(*child, budget - 1))
                .find(|shape| *shape != ValueShape::Any)
                .unwrap_or(ValueShape::Any),
            _ => ValueShape::Any,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(types: Vec<PrimitiveType>) -> SchemaNode {
        SchemaNode::new(
            SchemaKind::Primitive(PrimitiveSchema {
                types,
                ..PrimitiveSchema::default()
            }),
            "test#",
        )
    }

    #[test]
    fn test_reserve_then_set() {
        let mut arena = SchemaArena::new();
        let id = arena.reserve("doc#/Tree");
        assert!(matches!(arena.get(id).kind, SchemaKind::Reference(_)));

        arena.set(id, SchemaNode::new(SchemaKind::Any, "doc#/Tree"));
        assert!(matches!(arena.get(id).kind, SchemaKind::Any));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_shape_of_primitives() {
        let mut arena = SchemaArena::new();
        let int = arena.push(primitive(vec![PrimitiveType::Integer]));
        let mixed = arena.push(primitive(vec![PrimitiveType::Integer, PrimitiveType::String]));
        assert_eq!(arena.shape(int), ValueShape::Integer);
        assert_eq!(arena.shape(mixed), ValueShape::Any);
    }

    #[test]
    fn test_shape_looks_through_all_of() {
        let mut arena = SchemaArena::new();
        let any = arena.push(SchemaNode::new(SchemaKind::Any, "test#"));
        let boolean = arena.push(primitive(vec![PrimitiveType::Boolean]));
        let all = arena.push(SchemaNode::new(
            SchemaKind::Combinator(Combinator {
                kind: CombinatorKind::AllOf,
                children: vec![any, boolean],
                declared: Vec::new(),
            }),
            "test#",
        ));
        assert_eq!(arena.shape(all), ValueShape::Boolean);
    }

    #[test]
    fn test_shape_of_self_referencing_all_of_terminates() {
        let mut arena = SchemaArena::new();
        let id = arena.reserve("doc#/Loop");
        arena.set(
            id,
            SchemaNode::new(
                SchemaKind::Combinator(Combinator {
                    kind: CombinatorKind::AllOf,
                    children: vec![id],
                    declared: Vec::new(),
                }),
                "doc#/Loop",
            ),
        );
        assert_eq!(arena.shape(id), ValueShape::Any);
    }
}

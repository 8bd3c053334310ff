//! Reference resolution.
//!
//! Resolution runs in two passes. The async pass walks every schema
//! reachable from the entry points and fetches each referenced document
//! once. The sync pass compiles the reachable schemas into a
//! [`SchemaArena`], memoising by `document#pointer` so recursive references
//! become arena cycles instead of infinite expansion.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use euclid_core::SchemaResolutionError;
use indexmap::IndexMap;
use regex::Regex;
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::document::{
    collect_references, escape_token, navigate, resolve_reference, DefaultFetcher,
    DocumentFetcher, Target,
};
use crate::format::Format;
use crate::model::{
    AdditionalProperties, ArraySchema, Bound, Combinator, CombinatorKind, Enumeration,
    ObjectSchema, Pattern, PrimitiveSchema, PrimitiveType, SchemaArena, SchemaId, SchemaKind,
    SchemaNode,
};
use crate::numeric::Decimal;
use crate::validator::SchemaSet;

type Result<T> = std::result::Result<T, SchemaResolutionError>;

const OBJECT_KEYWORDS: &[&str] = &[
    "properties",
    "required",
    "additionalProperties",
    "minProperties",
    "maxProperties",
];
const ARRAY_KEYWORDS: &[&str] = &["items", "minItems", "maxItems", "uniqueItems"];
const SCALAR_KEYWORDS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "pattern",
    "format",
];

/// Resolver settings.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Base for relative document references written in the root document.
    /// When unset they resolve against the root document's own location.
    pub remote_base: Option<Url>,
    /// Per-request limit for remote fetches.
    pub fetch_timeout: Duration,
    /// Maximum number of documents, root included.
    pub max_documents: usize,
    /// Maximum nesting the validator descends before failing.
    pub max_validation_depth: usize,
    /// Reject properties an object does not declare unless it says
    /// otherwise with `additionalProperties`.
    pub deny_undeclared_properties: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            remote_base: None,
            fetch_timeout: Duration::from_secs(10),
            max_documents: 64,
            max_validation_depth: 128,
            deny_undeclared_properties: true,
        }
    }
}

/// Output of [`SchemaResolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The compiled schemas.
    pub schemas: SchemaSet,
    /// One id per entry point, in the order given.
    pub roots: Vec<SchemaId>,
}

/// Turns raw schema definitions spread over one or more documents into a
/// fully dereferenced [`SchemaSet`].
///
/// # Example
///
/// ```
/// use euclid_schema::{ResolverOptions, SchemaResolver};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let resolver = SchemaResolver::new(ResolverOptions::default());
/// let schema = json!({"type": "integer", "minimum": 0});
/// let (schemas, root) = resolver.resolve_schema(&schema).await.unwrap();
///
/// assert!(schemas.validate(root, &json!(3)).is_ok());
/// assert!(schemas.validate(root, &json!(-1)).is_err());
/// # });
/// ```
#[derive(Clone)]
pub struct SchemaResolver {
    options: ResolverOptions,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl std::fmt::Debug for SchemaResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaResolver")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SchemaResolver {
    /// Creates a resolver that fetches over HTTP and from local files.
    #[must_use]
    pub fn new(options: ResolverOptions) -> Self {
        let fetcher = Arc::new(DefaultFetcher::new(options.fetch_timeout));
        Self { options, fetcher }
    }

    /// Creates a resolver with a custom document source.
    #[must_use]
    pub fn with_fetcher(options: ResolverOptions, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self { options, fetcher }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Returns the document source.
    #[must_use]
    pub fn fetcher(&self) -> &Arc<dyn DocumentFetcher> {
        &self.fetcher
    }

    /// Resolves a standalone schema value.
    pub async fn resolve_schema(&self, schema: &Value) -> Result<(SchemaSet, SchemaId)> {
        let root_url = Url::parse("memory:///schema.json")
            .map_err(|e| SchemaResolutionError::invalid_schema("memory:///schema.json", e.to_string()))?;
        let resolution = self.resolve(&root_url, schema, &[String::new()]).await?;
        let root = resolution.roots.first().copied().ok_or_else(|| {
            SchemaResolutionError::unresolvable("#", "schema produced no root")
        })?;
        Ok((resolution.schemas, root))
    }

    /// Resolves the schemas at `entries`, JSON pointers into `root`.
    ///
    /// `root_url` locates the root document so relative references inside it
    /// can be followed.
    pub async fn resolve(
        &self,
        root_url: &Url,
        root: &Value,
        entries: &[String],
    ) -> Result<Resolution> {
        let documents = self.load_documents(root_url, root, entries).await?;
        info!(
            root = %root_url,
            documents = documents.len(),
            entries = entries.len(),
            "loaded schema documents"
        );

        let mut compiler = Compiler {
            documents: &documents,
            root_url,
            options: &self.options,
            arena: SchemaArena::new(),
            memo: HashMap::new(),
        };
        let mut roots = Vec::with_capacity(entries.len());
        for pointer in entries {
            let target = Target::new(root_url.clone(), pointer.clone());
            let reference = format!("#{pointer}");
            roots.push(compiler.compile(&target, &reference)?);
        }

        let mut arena = compiler.arena;
        finalize(&mut arena)?;
        debug!(nodes = arena.len(), "compiled schema arena");

        Ok(Resolution {
            schemas: SchemaSet::new(arena, self.options.max_validation_depth),
            roots,
        })
    }

    async fn load_documents(
        &self,
        root_url: &Url,
        root: &Value,
        entries: &[String],
    ) -> Result<HashMap<Url, Value>> {
        let mut documents = HashMap::new();
        documents.insert(root_url.clone(), root.clone());

        let mut queue: Vec<(Target, String)> = entries
            .iter()
            .map(|p| (Target::new(root_url.clone(), p.clone()), format!("#{p}")))
            .collect();
        let mut seen = HashSet::new();

        while let Some((target, reference)) = queue.pop() {
            if !seen.insert(target.key()) {
                continue;
            }

            let references: Vec<String> = {
                let document = documents.get(&target.document).ok_or_else(|| {
                    SchemaResolutionError::unresolvable(&reference, "document was not loaded")
                })?;
                let value = navigate(document, &target.pointer)
                    .map_err(|reason| SchemaResolutionError::unresolvable(&reference, reason))?;
                let mut found = Vec::new();
                collect_references(value, &mut found);
                found.into_iter().map(str::to_string).collect()
            };

            let in_root = target.document == *root_url;
            for reference in references {
                let next = resolve_reference(
                    &target.document,
                    &reference,
                    self.options.remote_base.as_ref(),
                    in_root,
                )
                .map_err(|reason| SchemaResolutionError::unresolvable(&reference, reason))?;

                if !documents.contains_key(&next.document) {
                    if documents.len() >= self.options.max_documents {
                        return Err(SchemaResolutionError::TooManyDocuments {
                            reference,
                            limit: self.options.max_documents,
                        });
                    }
                    debug!(reference = %reference, url = %next.document, "fetching referenced document");
                    let fetched = self
                        .fetcher
                        .fetch(&next.document)
                        .await
                        .map_err(|e| SchemaResolutionError::unreachable(&reference, e))?;
                    documents.insert(next.document.clone(), fetched);
                }
                queue.push((next, reference));
            }
        }

        Ok(documents)
    }
}

struct Compiler<'a> {
    documents: &'a HashMap<Url, Value>,
    root_url: &'a Url,
    options: &'a ResolverOptions,
    arena: SchemaArena,
    memo: HashMap<String, SchemaId>,
}

impl<'a> Compiler<'a> {
    fn lookup(&self, target: &Target, reference: &str) -> Result<&'a Value> {
        let documents: &'a HashMap<Url, Value> = self.documents;
        let document = documents.get(&target.document).ok_or_else(|| {
            SchemaResolutionError::unresolvable(reference, "document was not loaded")
        })?;
        navigate(document, &target.pointer)
            .map_err(|reason| SchemaResolutionError::unresolvable(reference, reason))
    }

    /// Compiles the schema at `target`, following `$ref` chains.
    fn compile(&mut self, target: &Target, reference: &str) -> Result<SchemaId> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = target.clone();
        let mut current_ref = reference.to_string();

        loop {
            let key = current.key();
            if let Some(&id) = self.memo.get(&key) {
                self.remember(chain, id);
                return Ok(id);
            }
            if chain.contains(&key) {
                chain.push(key);
                return Err(SchemaResolutionError::Cycle {
                    reference: current_ref,
                    chain: chain.join(" -> "),
                });
            }

            let value = self.lookup(&current, &current_ref)?;
            if let Some(next_ref) = value.get("$ref").and_then(Value::as_str) {
                let in_root = current.document == *self.root_url;
                let next = resolve_reference(
                    &current.document,
                    next_ref,
                    self.options.remote_base.as_ref(),
                    in_root,
                )
                .map_err(|reason| SchemaResolutionError::unresolvable(next_ref, reason))?;
                chain.push(key);
                current = next;
                current_ref = next_ref.to_string();
                continue;
            }

            let id = self.arena.reserve(&key);
            self.memo.insert(key, id);
            let node = self.build(&current, value)?;
            self.arena.set(id, node);
            self.remember(chain, id);
            return Ok(id);
        }
    }

    fn remember(&mut self, chain: Vec<String>, id: SchemaId) {
        for key in chain {
            self.memo.insert(key, id);
        }
    }

    fn child(&mut self, parent: &Target, path: &[&str]) -> Result<SchemaId> {
        let mut pointer = parent.pointer.clone();
        for segment in path {
            pointer.push('/');
            pointer.push_str(&escape_token(segment));
        }
        let target = Target::new(parent.document.clone(), pointer);
        let reference = target.key();
        self.compile(&target, &reference)
    }

    fn build(&mut self, target: &Target, value: &'a Value) -> Result<SchemaNode> {
        let location = target.key();
        let map = match value {
            Value::Bool(true) => return Ok(SchemaNode::new(SchemaKind::Any, location)),
            Value::Bool(false) => return Ok(SchemaNode::new(SchemaKind::Never, location)),
            Value::Object(map) => map,
            _ => {
                return Err(SchemaResolutionError::invalid_schema(
                    location,
                    "a schema must be an object or a boolean",
                ))
            }
        };

        let mut nullable = map.get("nullable") == Some(&Value::Bool(true));
        let mut parts: Vec<SchemaKind> = Vec::new();

        match declared_types(map, &location)? {
            Some(types) => {
                let mut primitives = Vec::new();
                let mut typed_parts = Vec::new();
                for name in &types {
                    match name.as_str() {
                        "null" => nullable = true,
                        "object" => typed_parts.push(self.object(target, map, true)?),
                        "array" => typed_parts.push(self.array(target, map, true)?),
                        other => primitives.push(primitive_type(other, &location)?),
                    }
                }
                if primitives.is_empty() && typed_parts.is_empty() {
                    primitives.push(PrimitiveType::Null);
                }
                if !primitives.is_empty() {
                    typed_parts.push(SchemaKind::Primitive(scalar(map, primitives, &location)?));
                }
                parts.push(self.any_of(typed_parts, &location));
            }
            None => {
                if has_any(map, OBJECT_KEYWORDS) {
                    parts.push(self.object(target, map, false)?);
                }
                if has_any(map, ARRAY_KEYWORDS) {
                    parts.push(self.array(target, map, false)?);
                }
                if has_any(map, SCALAR_KEYWORDS) {
                    parts.push(SchemaKind::Primitive(scalar(map, Vec::new(), &location)?));
                }
            }
        }

        for kind in [CombinatorKind::AllOf, CombinatorKind::AnyOf, CombinatorKind::OneOf] {
            let Some(children) = map.get(kind.keyword()) else {
                continue;
            };
            let children = children
                .as_array()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    SchemaResolutionError::invalid_schema(
                        &location,
                        format!("{} must be a non-empty array", kind.keyword()),
                    )
                })?;
            let mut ids = Vec::with_capacity(children.len());
            for index in 0..children.len() {
                ids.push(self.child(target, &[kind.keyword(), index.to_string().as_str()])?);
            }
            parts.push(SchemaKind::Combinator(Combinator {
                kind,
                children: ids,
                declared: Vec::new(),
            }));
        }

        if map.contains_key("not") {
            parts.push(SchemaKind::Not(self.child(target, &["not"])?));
        }

        let kind = match parts.len() {
            0 => SchemaKind::Any,
            1 => parts.remove(0),
            _ => {
                let children = parts
                    .into_iter()
                    .map(|kind| self.arena.push(SchemaNode::new(kind, &location)))
                    .collect();
                SchemaKind::Combinator(Combinator {
                    kind: CombinatorKind::AllOf,
                    children,
                    declared: Vec::new(),
                })
            }
        };

        let enumeration = if let Some(values) = map.get("enum") {
            let values = values.as_array().ok_or_else(|| {
                SchemaResolutionError::invalid_schema(&location, "enum must be an array")
            })?;
            Some(Enumeration {
                values: values.clone(),
                is_const: false,
            })
        } else {
            map.get("const").map(|value| Enumeration {
                values: vec![value.clone()],
                is_const: true,
            })
        };

        Ok(SchemaNode {
            kind,
            nullable,
            enumeration,
            location,
        })
    }

    /// Wraps several alternatives for a multi-type `type` in `anyOf`.
    fn any_of(&mut self, mut parts: Vec<SchemaKind>, location: &str) -> SchemaKind {
        if parts.len() == 1 {
            return parts.remove(0);
        }
        let children = parts
            .into_iter()
            .map(|kind| self.arena.push(SchemaNode::new(kind, location)))
            .collect();
        SchemaKind::Combinator(Combinator {
            kind: CombinatorKind::AnyOf,
            children,
            declared: Vec::new(),
        })
    }

    fn object(
        &mut self,
        target: &Target,
        map: &'a Map<String, Value>,
        require_type: bool,
    ) -> Result<SchemaKind> {
        let location = target.key();

        let mut properties = IndexMap::new();
        if let Some(declared) = map.get("properties") {
            let declared = declared.as_object().ok_or_else(|| {
                SchemaResolutionError::invalid_schema(&location, "properties must be an object")
            })?;
            for name in declared.keys() {
                let id = self.child(target, &["properties", name.as_str()])?;
                properties.insert(name.clone(), id);
            }
        }

        let required = match map.get("required") {
            None => Vec::new(),
            Some(Value::Array(names)) => names
                .iter()
                .map(|n| {
                    n.as_str().map(str::to_string).ok_or_else(|| {
                        SchemaResolutionError::invalid_schema(
                            &location,
                            "required must list property names",
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(SchemaResolutionError::invalid_schema(
                    &location,
                    "required must be an array",
                ))
            }
        };

        let additional = match map.get("additionalProperties") {
            Some(Value::Bool(true)) => AdditionalProperties::Allow,
            Some(Value::Bool(false)) => AdditionalProperties::Deny,
            Some(Value::Object(_)) => {
                AdditionalProperties::Schema(self.child(target, &["additionalProperties"])?)
            }
            Some(_) => {
                return Err(SchemaResolutionError::invalid_schema(
                    &location,
                    "additionalProperties must be a boolean or a schema",
                ))
            }
            None if self.options.deny_undeclared_properties && !properties.is_empty() => {
                AdditionalProperties::Sealed
            }
            None => AdditionalProperties::Allow,
        };

        Ok(SchemaKind::Object(ObjectSchema {
            require_type,
            properties,
            required,
            additional,
            min_properties: count(map, "minProperties", &location)?,
            max_properties: count(map, "maxProperties", &location)?,
        }))
    }

    fn array(
        &mut self,
        target: &Target,
        map: &'a Map<String, Value>,
        require_type: bool,
    ) -> Result<SchemaKind> {
        let location = target.key();
        let items = match map.get("items") {
            None => None,
            Some(Value::Array(_)) => {
                return Err(SchemaResolutionError::invalid_schema(
                    &location,
                    "tuple-style items are not supported",
                ))
            }
            Some(_) => Some(self.child(target, &["items"])?),
        };
        let unique_items = match map.get("uniqueItems") {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                return Err(SchemaResolutionError::invalid_schema(
                    &location,
                    "uniqueItems must be a boolean",
                ))
            }
        };

        Ok(SchemaKind::Array(ArraySchema {
            require_type,
            items,
            min_items: count(map, "minItems", &location)?,
            max_items: count(map, "maxItems", &location)?,
            unique_items,
        }))
    }
}

fn has_any(map: &Map<String, Value>, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| map.contains_key(*k))
}

fn declared_types(map: &Map<String, Value>, location: &str) -> Result<Option<Vec<String>>> {
    match map.get("type") {
        None => Ok(None),
        Some(Value::String(name)) => Ok(Some(vec![name.clone()])),
        Some(Value::Array(names)) if !names.is_empty() => names
            .iter()
            .map(|n| {
                n.as_str().map(str::to_string).ok_or_else(|| {
                    SchemaResolutionError::invalid_schema(location, "type names must be strings")
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(SchemaResolutionError::invalid_schema(
            location,
            "type must be a string or a non-empty array",
        )),
    }
}

fn primitive_type(name: &str, location: &str) -> Result<PrimitiveType> {
    match name {
        "string" => Ok(PrimitiveType::String),
        "number" => Ok(PrimitiveType::Number),
        "integer" => Ok(PrimitiveType::Integer),
        "boolean" => Ok(PrimitiveType::Boolean),
        "null" => Ok(PrimitiveType::Null),
        other => Err(SchemaResolutionError::invalid_schema(
            location,
            format!("unknown type '{other}'"),
        )),
    }
}

fn count(map: &Map<String, Value>, keyword: &str, location: &str) -> Result<Option<u64>> {
    match map.get(keyword) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| {
                SchemaResolutionError::invalid_schema(
                    location,
                    format!("{keyword} must be a non-negative integer"),
                )
            }),
    }
}

fn number(map: &Map<String, Value>, keyword: &str, location: &str) -> Result<Option<Bound>> {
    match map.get(keyword) {
        None | Some(Value::Bool(_)) => Ok(None),
        Some(Value::Number(n)) => {
            let value = Decimal::from_number(n).ok_or_else(|| {
                SchemaResolutionError::invalid_schema(location, format!("{keyword} is not a number"))
            })?;
            Ok(Some(Bound {
                value,
                text: n.to_string(),
                exclusive: false,
            }))
        }
        Some(_) => Err(SchemaResolutionError::invalid_schema(
            location,
            format!("{keyword} must be a number"),
        )),
    }
}

/// Combines an inclusive bound with an OpenAPI 3.0 boolean or 3.1 numeric
/// exclusive bound. `lower` selects which side is tighter.
fn bound(
    map: &Map<String, Value>,
    inclusive: &str,
    exclusive: &str,
    lower: bool,
    location: &str,
) -> Result<Option<Bound>> {
    let mut base = number(map, inclusive, location)?;
    match map.get(exclusive) {
        Some(Value::Bool(true)) => {
            if let Some(b) = &mut base {
                b.exclusive = true;
            }
        }
        Some(Value::Number(_)) => {
            let mut strict = number(map, exclusive, location)?;
            if let Some(s) = &mut strict {
                s.exclusive = true;
            }
            base = match (base, strict) {
                (Some(b), Some(s)) => {
                    let strict_is_tighter = if lower { s.value >= b.value } else { s.value <= b.value };
                    Some(if strict_is_tighter { s } else { b })
                }
                (b, s) => s.or(b),
            };
        }
        None | Some(Value::Bool(false)) => {}
        Some(_) => {
            return Err(SchemaResolutionError::invalid_schema(
                location,
                format!("{exclusive} must be a boolean or a number"),
            ))
        }
    }
    Ok(base)
}

fn scalar(
    map: &Map<String, Value>,
    types: Vec<PrimitiveType>,
    location: &str,
) -> Result<PrimitiveSchema> {
    let multiple_of = match number(map, "multipleOf", location)? {
        Some(b) if b.value.is_negative() || b.value.is_zero() => {
            return Err(SchemaResolutionError::invalid_schema(
                location,
                "multipleOf must be greater than zero",
            ))
        }
        Some(b) => Some((b.value, b.text)),
        None => None,
    };

    let pattern = match map.get("pattern") {
        None => None,
        Some(Value::String(source)) => Some(Pattern {
            regex: Regex::new(source).map_err(|e| {
                SchemaResolutionError::invalid_schema(location, format!("invalid pattern: {e}"))
            })?,
            source: source.clone(),
        }),
        Some(_) => {
            return Err(SchemaResolutionError::invalid_schema(
                location,
                "pattern must be a string",
            ))
        }
    };

    Ok(PrimitiveSchema {
        types,
        minimum: bound(map, "minimum", "exclusiveMinimum", true, location)?,
        maximum: bound(map, "maximum", "exclusiveMaximum", false, location)?,
        multiple_of,
        min_length: count(map, "minLength", location)?,
        max_length: count(map, "maxLength", location)?,
        pattern,
        format: map.get("format").and_then(Value::as_str).map(Format::parse),
    })
}

/// Checks the compiled arena and fills in derived data.
fn finalize(arena: &mut SchemaArena) -> Result<()> {
    for (_, node) in arena.iter() {
        if let SchemaKind::Reference(reference) = &node.kind {
            return Err(SchemaResolutionError::unresolvable(
                reference,
                "reference was never resolved",
            ));
        }
    }

    reject_in_place_cycles(arena)?;

    let all_of: Vec<SchemaId> = arena
        .iter()
        .filter(|(_, n)| {
            matches!(&n.kind, SchemaKind::Combinator(c) if c.kind == CombinatorKind::AllOf)
        })
        .map(|(id, _)| id)
        .collect();
    for id in all_of {
        let mut declared = Vec::new();
        let mut visited = HashSet::new();
        collect_declared(arena, id, &mut visited, &mut declared);
        if let SchemaKind::Combinator(c) = &mut arena.get_mut(id).kind {
            c.declared = declared;
        }
    }
    Ok(())
}

/// Rejects loops made only of composition edges. Such a loop would make the
/// validator re-enter a schema without descending into the instance.
fn reject_in_place_cycles(arena: &SchemaArena) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; arena.len()];
    for (start, _) in arena.iter() {
        if marks[start.index()] != Mark::New {
            continue;
        }
        // Iterative DFS: (node, next child index).
        let mut stack: Vec<(SchemaId, usize)> = vec![(start, 0)];
        marks[start.index()] = Mark::Active;
        while let Some((node, next)) = stack.last().copied() {
            let children = arena.in_place_children(node);
            if let Some(&child) = children.get(next) {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                match marks[child.index()] {
                    Mark::New => {
                        marks[child.index()] = Mark::Active;
                        stack.push((child, 0));
                    }
                    Mark::Active => {
                        let begin = stack.iter().position(|(id, _)| *id == child).unwrap_or(0);
                        let mut chain: Vec<String> = stack[begin..]
                            .iter()
                            .map(|(id, _)| arena.get(*id).location.clone())
                            .collect();
                        chain.push(arena.get(child).location.clone());
                        return Err(SchemaResolutionError::Cycle {
                            reference: arena.get(child).location.clone(),
                            chain: chain.join(" -> "),
                        });
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node.index()] = Mark::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}

fn collect_declared(
    arena: &SchemaArena,
    id: SchemaId,
    visited: &mut HashSet<SchemaId>,
    out: &mut Vec<String>,
) {
    if !visited.insert(id) {
        return;
    }
    match &arena.get(id).kind {
        SchemaKind::Object(object) => {
            for name in object.properties.keys() {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
        }
        SchemaKind::Combinator(c) => {
            for child in &c.children {
                collect_declared(arena, *child, visited, out);
            }
        }
        _ => {}
    }
}

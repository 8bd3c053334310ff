//! Specification loading.
//!
//! Reads an OpenAPI 3 document (YAML or JSON) and extracts its operations.
//! Schemas stay as raw JSON in the document until
//! [`Specification::resolve_schemas`] compiles them.

use std::path::Path;
use std::time::Duration;

use euclid_core::{SchemaResolutionError, SpecLoadError};
use euclid_schema::document::{escape_token, navigate, parse_document};
use euclid_schema::{DefaultFetcher, DocumentFetcher, SchemaId, SchemaResolver, SchemaSet};
use http::Method;
use reqwest::Url;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::operation::{is_json, media_essence, Operation, Parameter, ParameterLocation, RequestBody};

/// Methods a path item may declare, in the order operations are listed.
const METHODS: [(&str, Method); 8] = [
    ("get", Method::GET),
    ("put", Method::PUT),
    ("post", Method::POST),
    ("delete", Method::DELETE),
    ("options", Method::OPTIONS),
    ("head", Method::HEAD),
    ("patch", Method::PATCH),
    ("trace", Method::TRACE),
];

/// Base URL for documents that were not read from a file or URL.
pub const IN_MEMORY_BASE: &str = "memory:///openapi.yaml";

/// Compiled schemas for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationSchemas {
    /// Request body schema.
    pub body: Option<SchemaId>,
    /// One entry per [`Operation::parameters`] item.
    pub parameters: Vec<Option<SchemaId>>,
}

/// All schemas of a specification, compiled.
#[derive(Debug, Clone)]
pub struct ResolvedSpecification {
    /// The compiled schema arena.
    pub schemas: SchemaSet,
    /// Indexed like [`Specification::operations`].
    pub operations: Vec<OperationSchemas>,
}

/// A loaded OpenAPI 3 document.
#[derive(Debug, Clone)]
pub struct Specification {
    document: Value,
    base_url: Url,
    openapi: String,
    title: Option<String>,
    operations: Vec<Operation>,
}

impl Specification {
    /// Reads a document from disk. YAML and JSON are both accepted.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SpecLoadError> {
        let path = path.as_ref();
        let source_name = path.display().to_string();
        info!(path = %source_name, "loading specification from file");

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SpecLoadError::Io {
                source_name: source_name.clone(),
                source,
            })?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| SpecLoadError::Io {
                    source_name: source_name.clone(),
                    source,
                })?
                .join(path)
        };
        let base_url = Url::from_file_path(&absolute)
            .map_err(|()| SpecLoadError::invalid(&source_name, "path cannot be used as a URL"))?;
        let document = parse_document(&text, Some(source_name.as_str()))
            .map_err(|e| SpecLoadError::parse(&source_name, e))?;
        Self::from_value(document, base_url)
    }

    /// Fetches a document over HTTP(S) or from a `file://` URL.
    pub async fn from_url(url: &Url, timeout: Duration) -> Result<Self, SpecLoadError> {
        info!(url = %url, "loading specification from URL");
        let document = DefaultFetcher::new(timeout)
            .fetch(url)
            .await
            .map_err(|e| SpecLoadError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Self::from_value(document, url.clone())
    }

    /// Parses document text. Relative references resolve against `base_url`.
    pub fn parse(text: &str, base_url: Url) -> Result<Self, SpecLoadError> {
        let document = parse_document(text, Some(base_url.path()))
            .map_err(|e| SpecLoadError::parse(base_url.as_str(), e))?;
        Self::from_value(document, base_url)
    }

    /// Parses document text held in memory, with [`IN_MEMORY_BASE`] as its
    /// location.
    pub fn from_text(text: &str) -> Result<Self, SpecLoadError> {
        Self::parse(text, in_memory_base()?)
    }

    /// Builds a specification from an already parsed document.
    pub fn from_value(document: Value, base_url: Url) -> Result<Self, SpecLoadError> {
        let root = document
            .as_object()
            .ok_or_else(|| SpecLoadError::invalid("#", "document must be an object"))?;

        let openapi = root
            .get("openapi")
            .and_then(Value::as_str)
            .ok_or_else(|| SpecLoadError::invalid("#/openapi", "missing OpenAPI version"))?;
        if !openapi.starts_with("3.") {
            return Err(SpecLoadError::invalid(
                "#/openapi",
                format!("unsupported OpenAPI version {openapi}"),
            ));
        }
        let openapi = openapi.to_string();
        let title = root
            .get("info")
            .and_then(|info| info.get("title"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let operations = parse_operations(&document)?;
        info!(
            title = title.as_deref().unwrap_or("untitled"),
            openapi = %openapi,
            operations = operations.len(),
            "specification loaded"
        );

        Ok(Self {
            document,
            base_url,
            openapi,
            title,
            operations,
        })
    }

    /// Returns the raw document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns the location relative references resolve against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the `openapi` version string.
    #[must_use]
    pub fn openapi_version(&self) -> &str {
        &self.openapi
    }

    /// Returns `info.title`.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns operations in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Finds an operation by id.
    #[must_use]
    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// Pointers of every schema the operations use, without duplicates.
    #[must_use]
    pub fn schema_entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = Vec::new();
        let pointers = self.operations.iter().flat_map(|op| {
            op.parameters
                .iter()
                .filter_map(|p| p.schema.as_ref())
                .chain(op.request_body.as_ref().and_then(|b| b.schema.as_ref()))
        });
        for pointer in pointers {
            if !entries.contains(pointer) {
                entries.push(pointer.clone());
            }
        }
        entries
    }

    /// Compiles every operation schema with `resolver`.
    pub async fn resolve_schemas(
        &self,
        resolver: &SchemaResolver,
    ) -> Result<ResolvedSpecification, SchemaResolutionError> {
        let entries = self.schema_entries();
        let resolution = resolver
            .resolve(&self.base_url, &self.document, &entries)
            .await?;
        let id_of = |pointer: &String| {
            entries
                .iter()
                .position(|e| e == pointer)
                .and_then(|i| resolution.roots.get(i).copied())
        };

        let operations = self
            .operations
            .iter()
            .map(|op| OperationSchemas {
                body: op
                    .request_body
                    .as_ref()
                    .and_then(|b| b.schema.as_ref())
                    .and_then(id_of),
                parameters: op
                    .parameters
                    .iter()
                    .map(|p| p.schema.as_ref().and_then(id_of))
                    .collect(),
            })
            .collect();
        debug!(entries = entries.len(), "operation schemas resolved");

        Ok(ResolvedSpecification {
            schemas: resolution.schemas,
            operations,
        })
    }
}

fn in_memory_base() -> Result<Url, SpecLoadError> {
    Url::parse(IN_MEMORY_BASE).map_err(|e| SpecLoadError::invalid(IN_MEMORY_BASE, e.to_string()))
}

fn pointer_of(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| format!("/{}", escape_token(s)))
        .collect()
}

/// Follows a local `$ref` on a parameter or request body object.
fn follow_local<'a>(
    document: &'a Value,
    value: &'a Value,
    pointer: String,
) -> Result<(&'a Value, String), SpecLoadError> {
    let mut current = (value, pointer);
    for _ in 0..16 {
        let Some(reference) = current.0.get("$ref").and_then(Value::as_str) else {
            return Ok(current);
        };
        let Some(target) = reference.strip_prefix('#') else {
            return Err(SpecLoadError::invalid(
                format!("#{}", current.1),
                format!("only local references are supported here, found '{reference}'"),
            ));
        };
        let resolved = navigate(document, target)
            .map_err(|reason| {
                SpecLoadError::invalid(format!("#{}", current.1), format!("{reference}: {reason}"))
            })?;
        current = (resolved, target.to_string());
    }
    Err(SpecLoadError::invalid(format!("#{}", current.1), "reference chain is too long"))
}

fn parse_operations(document: &Value) -> Result<Vec<Operation>, SpecLoadError> {
    let paths = document
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| SpecLoadError::invalid("#/paths", "document has no paths object"))?;

    let mut operations = Vec::new();
    for (path, item) in paths {
        if !path.starts_with('/') {
            return Err(SpecLoadError::invalid(
                format!("#{}", pointer_of(&["paths", path.as_str()])),
                "path must start with '/'",
            ));
        }
        let item_pointer = pointer_of(&["paths", path.as_str()]);
        let (item, item_pointer) = follow_local(document, item, item_pointer)?;
        let Some(item) = item.as_object() else {
            return Err(SpecLoadError::invalid(
                format!("#{item_pointer}"),
                "path item must be an object",
            ));
        };

        let shared = parse_parameters(document, item, &item_pointer)?;

        for (key, method) in &METHODS {
            let Some(op) = item.get(*key).and_then(Value::as_object) else {
                continue;
            };
            let pointer = format!("{item_pointer}/{key}");
            let id = op
                .get("operationId")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    SpecLoadError::invalid(format!("#{pointer}"), "operation has no operationId")
                })?;

            let mut parameters = shared.clone();
            for own in parse_parameters(document, op, &pointer)? {
                match parameters
                    .iter_mut()
                    .find(|p| p.name == own.name && p.location == own.location)
                {
                    Some(existing) => *existing = own,
                    None => parameters.push(own),
                }
            }

            let request_body = match op.get("requestBody") {
                Some(body) => Some(parse_body(document, body, format!("{pointer}/requestBody"))?),
                None => None,
            };

            debug!(operation_id = id, method = %method, path = %path, "found operation");
            operations.push(Operation {
                id: id.to_string(),
                method: method.clone(),
                path: path.clone(),
                pointer: format!("#{pointer}"),
                summary: op.get("summary").and_then(Value::as_str).map(str::to_string),
                tags: op
                    .get("tags")
                    .and_then(Value::as_array)
                    .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default(),
                deprecated: op.get("deprecated").and_then(Value::as_bool).unwrap_or(false),
                parameters,
                request_body,
            });
        }
    }
    Ok(operations)
}

fn parse_parameters(
    document: &Value,
    owner: &Map<String, Value>,
    owner_pointer: &str,
) -> Result<Vec<Parameter>, SpecLoadError> {
    let Some(list) = owner.get("parameters") else {
        return Ok(Vec::new());
    };
    let list = list.as_array().ok_or_else(|| {
        SpecLoadError::invalid(format!("#{owner_pointer}/parameters"), "parameters must be an array")
    })?;

    let mut parameters = Vec::with_capacity(list.len());
    for (index, raw) in list.iter().enumerate() {
        let (param, pointer) =
            follow_local(document, raw, format!("{owner_pointer}/parameters/{index}"))?;
        let location_text = format!("#{pointer}");

        let name = param
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SpecLoadError::invalid(&location_text, "parameter has no name"))?;
        let location = param
            .get("in")
            .and_then(Value::as_str)
            .and_then(ParameterLocation::parse)
            .ok_or_else(|| SpecLoadError::invalid(&location_text, "parameter has no valid 'in'"))?;
        let required = location == ParameterLocation::Path
            || param.get("required").and_then(Value::as_bool).unwrap_or(false);
        let schema = param.get("schema").map(|_| format!("{pointer}/schema"));

        parameters.push(Parameter {
            name: name.to_string(),
            location,
            required,
            schema,
        });
    }
    Ok(parameters)
}

fn parse_body(document: &Value, raw: &Value, pointer: String) -> Result<RequestBody, SpecLoadError> {
    let (body, pointer) = follow_local(document, raw, pointer)?;
    let content = body.get("content").and_then(Value::as_object);

    let mut content_types = Vec::new();
    let mut schema = None;
    for (media_type, media) in content.into_iter().flatten() {
        content_types.push(media_type.clone());
        if schema.is_none() && is_json(&media_essence(media_type)) && media.get("schema").is_some() {
            schema = Some(format!(
                "{pointer}/content/{}/schema",
                escape_token(media_type)
            ));
        }
    }

    Ok(RequestBody {
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
        content_types,
        schema,
    })
}

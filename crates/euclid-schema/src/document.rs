//! Source documents: fetching, parsing and JSON pointer navigation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::Url;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Failure to obtain a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL scheme has no fetcher.
    #[error("unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    /// The HTTP request failed or timed out.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A local file could not be read.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The body is neither JSON nor YAML.
    #[error("parse failed: {0}")]
    Parse(String),
}

/// Retrieves documents by URL.
///
/// The resolver calls this at most once per document while building.
pub trait DocumentFetcher: Send + Sync {
    /// Fetches and parses the document at `url` (without fragment).
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Value, FetchError>>;
}

/// Fetches `http(s)://` documents with `reqwest` and `file://` documents
/// from disk.
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl DefaultFetcher {
    /// Creates a fetcher whose HTTP requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn fetch_http(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        let text = response.text().await?;
        debug!(url = %url, bytes = text.len(), "fetched remote document");
        parse_document(&text, content_type.as_deref().or(Some(url.path())))
    }

    async fn fetch_file(&self, url: &Url) -> Result<Value, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|()| FetchError::Parse(format!("not a local path: {url}")))?;
        let text = tokio::fs::read_to_string(&path).await?;
        debug!(path = %path.display(), "read local document");
        parse_document(&text, Some(url.path()))
    }
}

impl DocumentFetcher for DefaultFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Value, FetchError>> {
        Box::pin(async move {
            match url.scheme() {
                "http" | "https" => self.fetch_http(url).await,
                "file" => self.fetch_file(url).await,
                other => Err(FetchError::UnsupportedScheme(other.to_string())),
            }
        })
    }
}

/// Serves documents from memory. Handy for tests and embedded specs.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    documents: HashMap<String, Value>,
}

impl StaticFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document under `url`.
    #[must_use]
    pub fn with_document(mut self, url: &str, document: Value) -> Self {
        self.documents.insert(url.to_string(), document);
        self
    }
}

impl DocumentFetcher for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Value, FetchError>> {
        Box::pin(async move {
            self.documents.get(url.as_str()).cloned().ok_or_else(|| {
                FetchError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no document registered for {url}"),
                ))
            })
        })
    }
}

impl<T: DocumentFetcher + ?Sized> DocumentFetcher for Arc<T> {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Value, FetchError>> {
        (**self).fetch(url)
    }
}

/// Parses a JSON or YAML document.
///
/// `hint` is a content type or file name; JSON is tried first when it
/// mentions `json` or when the text opens with `{` or `[`.
pub fn parse_document(text: &str, hint: Option<&str>) -> Result<Value, FetchError> {
    let trimmed = text.trim_start();
    let looks_json = hint.is_some_and(|h| h.contains("json"))
        || trimmed.starts_with('{')
        || trimmed.starts_with('[');
    if looks_json {
        if let Ok(value) = serde_json::from_str(text) {
            return Ok(value);
        }
    }
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| FetchError::Parse(e.to_string()))?;
    yaml_to_json(yaml)
}

/// YAML allows non-string keys such as `200:` under `responses`; JSON
/// objects do not, so scalar keys are rendered as strings.
fn yaml_to_json(value: serde_yaml::Value) -> Result<Value, FetchError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            let number: serde_json::Number = serde_json::from_str(&n.to_string())
                .map_err(|_| FetchError::Parse(format!("number {n} has no JSON form")))?;
            Value::Number(number)
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_json)
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(entries) => {
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (key, value) in entries {
                let key = match key {
                    Yaml::String(s) => s,
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    Yaml::Null => "null".to_string(),
                    other => {
                        return Err(FetchError::Parse(format!(
                            "unsupported mapping key {other:?}"
                        )))
                    }
                };
                map.insert(key, yaml_to_json(value)?);
            }
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

/// Escapes one JSON pointer token.
#[must_use]
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Follows a JSON pointer such as `/components/schemas/Pet`.
///
/// The empty pointer is the whole document.
pub fn navigate<'a>(document: &'a Value, pointer: &str) -> Result<&'a Value, String> {
    if pointer.is_empty() {
        return Ok(document);
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(format!("'{pointer}' is not a JSON pointer"));
    };

    let mut current = document;
    for raw in rest.split('/') {
        let token = raw.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map
                .get(&token)
                .ok_or_else(|| format!("no member '{token}'"))?,
            Value::Array(items) => token
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(|| format!("no item '{token}'"))?,
            _ => return Err(format!("cannot descend into a scalar at '{token}'")),
        };
    }
    Ok(current)
}

/// A reference target: the document URL and the pointer inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Document URL without fragment.
    pub document: Url,
    /// Decoded JSON pointer.
    pub pointer: String,
}

impl Target {
    /// Creates a target.
    #[must_use]
    pub fn new(document: Url, pointer: impl Into<String>) -> Self {
        Self {
            document,
            pointer: pointer.into(),
        }
    }

    /// Renders `document#pointer`.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}#{}", self.document, self.pointer)
    }
}

/// Resolves a `$ref` written in `base`.
///
/// Relative document references in the root document resolve against
/// `remote_base` when one is configured. References written inside any other
/// document resolve against that document's own URL.
pub fn resolve_reference(
    base: &Url,
    reference: &str,
    remote_base: Option<&Url>,
    base_is_root: bool,
) -> Result<Target, String> {
    let (doc_part, fragment) = match reference.split_once('#') {
        Some((doc, fragment)) => (doc, fragment),
        None => (reference, ""),
    };

    let document = if doc_part.is_empty() {
        base.clone()
    } else {
        let is_relative = Url::parse(doc_part).is_err();
        let against = match remote_base {
            Some(remote) if base_is_root && is_relative => remote,
            _ => base,
        };
        let mut joined = against
            .join(doc_part)
            .map_err(|e| format!("invalid reference URL: {e}"))?;
        joined.set_fragment(None);
        joined
    };

    let pointer = urlencoding::decode(fragment)
        .map_err(|e| format!("invalid percent-encoding: {e}"))?
        .into_owned();
    if !pointer.is_empty() && !pointer.starts_with('/') {
        return Err(format!("anchor fragments are not supported: #{pointer}"));
    }
    Ok(Target::new(document, pointer))
}

/// Keywords whose values are instance data, never schemas.
const DATA_KEYWORDS: &[&str] = &["example", "examples", "default", "enum", "const"];

/// Keywords whose members are user-chosen names mapping to schemas.
const NAME_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "dependentSchemas",
    "schemas",
    "responses",
];

/// Collects every `$ref` string under `value`, skipping instance data such
/// as `example` and `default` payloads.
pub(crate) fn collect_references<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    collect_in(value, false, out);
}

fn collect_in<'a>(value: &'a Value, name_map: bool, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) if name_map => {
            for child in map.values() {
                collect_in(child, false, out);
            }
        }
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                out.push(reference);
            }
            for (key, child) in map {
                let key = key.as_str();
                if key == "$ref" || DATA_KEYWORDS.contains(&key) {
                    continue;
                }
                collect_in(child, NAME_MAP_KEYWORDS.contains(&key), out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_in(item, false, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_navigate_escapes() {
        let doc = json!({"paths": {"/pets/{id}": {"get": {"x~y": [10, 20]}}}});
        let found = navigate(&doc, "/paths/~1pets~1{id}/get/x~0y/1").unwrap();
        assert_eq!(found, &json!(20));
        assert_eq!(navigate(&doc, "").unwrap(), &doc);
    }

    #[test]
    fn test_navigate_missing() {
        let doc = json!({"components": {"schemas": {}}});
        let err = navigate(&doc, "/components/schemas/Pet").unwrap_err();
        assert_eq!(err, "no member 'Pet'");
        assert!(navigate(&doc, "components").is_err());
    }

    #[test]
    fn test_escape_token() {
        assert_eq!(escape_token("/pets/{id}"), "~1pets~1{id}");
        assert_eq!(escape_token("a~b"), "a~0b");
        assert_eq!(escape_token("application/json"), "application~1json");
    }

    #[test]
    fn test_local_reference() {
        let base = url("file:///specs/api.yaml");
        let target = resolve_reference(&base, "#/components/schemas/Pet", None, true).unwrap();
        assert_eq!(target.document, base);
        assert_eq!(target.pointer, "/components/schemas/Pet");
    }

    #[test]
    fn test_relative_reference_in_root_uses_remote_base() {
        let base = url("file:///specs/api.yaml");
        let remote = url("http://127.0.0.1:8081/schemas/");
        let target =
            resolve_reference(&base, "person.yaml#/Person", Some(&remote), true).unwrap();
        assert_eq!(target.document.as_str(), "http://127.0.0.1:8081/schemas/person.yaml");
        assert_eq!(target.pointer, "/Person");
    }

    #[test]
    fn test_relative_reference_in_remote_document_uses_its_origin() {
        let base = url("http://127.0.0.1:8081/schemas/person.yaml");
        let remote = url("http://elsewhere.invalid/");
        let target =
            resolve_reference(&base, "address.yaml#/Address", Some(&remote), false).unwrap();
        assert_eq!(target.document.as_str(), "http://127.0.0.1:8081/schemas/address.yaml");
    }

    #[test]
    fn test_absolute_reference_ignores_remote_base() {
        let base = url("file:///specs/api.yaml");
        let remote = url("http://127.0.0.1:8081/");
        let target =
            resolve_reference(&base, "http://example.org/pet.json", Some(&remote), true).unwrap();
        assert_eq!(target.document.as_str(), "http://example.org/pet.json");
        assert_eq!(target.pointer, "");
    }

    #[test]
    fn test_percent_encoded_fragment() {
        let base = url("file:///specs/api.yaml");
        let target =
            resolve_reference(&base, "#/components/schemas/Pet%20Owner", None, true).unwrap();
        assert_eq!(target.pointer, "/components/schemas/Pet Owner");
    }

    #[test]
    fn test_anchor_fragment_rejected() {
        let base = url("file:///specs/api.yaml");
        assert!(resolve_reference(&base, "#Pet", None, true).is_err());
    }

    #[test]
    fn test_collect_references() {
        let doc = json!({
            "allOf": [{"$ref": "#/A"}, {"properties": {"b": {"$ref": "other.yaml#/B"}}}],
            "items": {"$ref": "#/C"}
        });
        let mut refs = Vec::new();
        collect_references(&doc, &mut refs);
        refs.sort_unstable();
        assert_eq!(refs, vec!["#/A", "#/C", "other.yaml#/B"]);
    }

    #[test]
    fn test_collect_references_skips_instance_data() {
        let doc = json!({
            "type": "object",
            "example": {"$ref": "http://unreachable.test/a.json"},
            "default": {"link": {"$ref": "b.json"}},
            "enum": [{"$ref": "c.json"}],
            "properties": {
                "default": {"$ref": "#/D"},
                "example": {"items": {"$ref": "#/E"}, "examples": [{"$ref": "f.json"}]}
            }
        });
        let mut refs = Vec::new();
        collect_references(&doc, &mut refs);
        refs.sort_unstable();
        assert_eq!(refs, vec!["#/D", "#/E"]);
    }

    #[test]
    fn test_parse_document_yaml_and_json() {
        let yaml = parse_document("type: object\nrequired: [name]\n", Some("pet.yaml")).unwrap();
        assert_eq!(yaml, json!({"type": "object", "required": ["name"]}));

        let json_doc = parse_document("{\"minimum\": 0.1}", None).unwrap();
        assert_eq!(json_doc["minimum"].to_string(), "0.1");

        assert!(parse_document("key: [unclosed", None).is_err());
    }

    #[test]
    fn test_yaml_numeric_keys_become_strings() {
        let doc = parse_document("responses:\n  200:\n    description: ok\n", None).unwrap();
        assert_eq!(doc, json!({"responses": {"200": {"description": "ok"}}}));
    }

    #[tokio::test]
    async fn test_static_fetcher() {
        let fetcher = StaticFetcher::new().with_document("http://x.test/a.json", json!({"type": "string"}));
        let found = fetcher.fetch(&url("http://x.test/a.json")).await.unwrap();
        assert_eq!(found["type"], "string");
        assert!(fetcher.fetch(&url("http://x.test/b.json")).await.is_err());
    }

    #[tokio::test]
    async fn test_default_fetcher_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pet.yaml");
        std::fs::write(&path, "type: string\nminLength: 2\n").unwrap();

        let fetcher = DefaultFetcher::new(Duration::from_secs(1));
        let found = fetcher.fetch(&Url::from_file_path(&path).unwrap()).await.unwrap();
        assert_eq!(found["minLength"], 2);
    }

    #[tokio::test]
    async fn test_default_fetcher_rejects_unknown_scheme() {
        let fetcher = DefaultFetcher::new(Duration::from_secs(1));
        let err = fetcher.fetch(&url("ftp://example.org/a.yaml")).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(s) if s == "ftp"));
    }
}

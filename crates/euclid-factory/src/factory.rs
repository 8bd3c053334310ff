//! The router factory.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use euclid_contract::{OperationRegistry, ResolvedSpecification, Specification, IN_MEMORY_BASE};
use euclid_core::{
    BoxedFailureHandler, BoxedHandler, BuildError, DuplicateOperationError, FailureContext,
    Handler, Response, SpecLoadError,
};
use euclid_schema::{SchemaResolver, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::options::FactoryOptions;
use crate::router::ApiRouter;

/// Builds an [`ApiRouter`] from an OpenAPI 3 document.
///
/// Creating a factory loads the document and resolves every schema it
/// uses, including remote references, within
/// [`FactoryOptions::build_timeout`]. Handlers and policies are then set
/// on the factory and [`get_router`](Self::get_router) freezes them into a
/// router. Any failure is returned as a [`BuildError`]; no partial router
/// is ever produced.
///
/// # Example
///
/// ```
/// use euclid_core::{response, RequestContext, HandlerError};
/// use euclid_factory::{FactoryOptions, RouterFactory};
/// use http::StatusCode;
///
/// # tokio_test::block_on(async {
/// let spec = r#"
/// openapi: 3.0.0
/// info: { title: Pets, version: "1" }
/// paths:
///   /pets:
///     get:
///       operationId: listPets
/// "#;
///
/// let mut factory = RouterFactory::from_str(spec, FactoryOptions::default()).await?;
/// factory.add_handler_by_operation_id("listPets", |_ctx: RequestContext| async {
///     Ok::<_, HandlerError>(response::text(StatusCode::OK, "[]"))
/// })?;
/// let router = factory.get_router()?;
/// assert!(router.registry().is_mounted("listPets"));
/// # Ok::<(), euclid_core::BuildError>(())
/// # }).unwrap();
/// ```
pub struct RouterFactory {
    spec: Specification,
    resolved: ResolvedSpecification,
    options: FactoryOptions,
    handlers: HashMap<String, BoxedHandler>,
    failure_handler: Option<BoxedFailureHandler>,
}

impl std::fmt::Debug for RouterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterFactory")
            .field("title", &self.spec.title())
            .field("operations", &self.spec.operations().len())
            .field("handlers", &self.handlers.len())
            .field("options", &self.options)
            .field("has_failure_handler", &self.failure_handler.is_some())
            .finish()
    }
}

impl RouterFactory {
    /// Loads a YAML or JSON document from disk.
    pub async fn from_file(
        path: impl AsRef<Path>,
        options: FactoryOptions,
    ) -> Result<Self, BuildError> {
        let path = path.as_ref().to_path_buf();
        let timeout = options.build_timeout;
        with_timeout(timeout, async move {
            let spec = Specification::from_file(&path).await?;
            Self::resolve(spec, options).await
        })
        .await
    }

    /// Parses document text. Relative references resolve against
    /// [`ResolverOptions::remote_base`](euclid_schema::ResolverOptions::remote_base).
    #[allow(clippy::should_implement_trait)]
    pub async fn from_str(text: &str, options: FactoryOptions) -> Result<Self, BuildError> {
        let spec = Specification::parse(text, in_memory_base()?)?;
        Self::from_specification(spec, options).await
    }

    /// Uses an already parsed document.
    pub async fn from_value(document: Value, options: FactoryOptions) -> Result<Self, BuildError> {
        let spec = Specification::from_value(document, in_memory_base()?)?;
        Self::from_specification(spec, options).await
    }

    /// Fetches the document over HTTP(S) or from a `file://` URL.
    pub async fn from_url(url: &Url, options: FactoryOptions) -> Result<Self, BuildError> {
        let url = url.clone();
        let timeout = options.build_timeout;
        let fetch_timeout = options.resolver.fetch_timeout;
        with_timeout(timeout, async move {
            let spec = Specification::from_url(&url, fetch_timeout).await?;
            Self::resolve(spec, options).await
        })
        .await
    }

    /// Resolves the schemas of a loaded specification.
    pub async fn from_specification(
        spec: Specification,
        options: FactoryOptions,
    ) -> Result<Self, BuildError> {
        let timeout = options.build_timeout;
        with_timeout(timeout, Self::resolve(spec, options)).await
    }

    async fn resolve(spec: Specification, options: FactoryOptions) -> Result<Self, BuildError> {
        info!(
            title = spec.title().unwrap_or("untitled"),
            openapi = spec.openapi_version(),
            operations = spec.operations().len(),
            "specification loaded"
        );
        check_unique_ids(&spec)?;
        let resolver = SchemaResolver::new(options.resolver.clone());
        let resolved = spec.resolve_schemas(&resolver).await?;
        Ok(Self {
            spec,
            resolved,
            options,
            handlers: HashMap::new(),
            failure_handler: None,
        })
    }

    /// Returns the loaded specification.
    pub fn specification(&self) -> &Specification {
        &self.spec
    }

    /// Returns the options in effect.
    pub fn options(&self) -> &FactoryOptions {
        &self.options
    }

    /// Binds a handler to an operation. A later binding for the same id
    /// replaces the earlier one.
    pub fn add_handler_by_operation_id<H: Handler>(
        &mut self,
        operation_id: &str,
        handler: H,
    ) -> Result<&mut Self, BuildError> {
        if self.spec.operation(operation_id).is_none() {
            return Err(BuildError::UnknownOperation {
                operation_id: operation_id.to_string(),
            });
        }
        if self
            .handlers
            .insert(operation_id.to_string(), handler.into_boxed())
            .is_some()
        {
            debug!(operation_id, "handler replaced");
        }
        Ok(self)
    }

    /// Whether operations without a handler are routable. When they are,
    /// they answer 501 Not Implemented after validation.
    pub fn mount_operations_without_handlers(&mut self, mount: bool) -> &mut Self {
        self.options.mount_operations_without_handlers = mount;
        self
    }

    /// Whether failures go to the failure handler. When disabled, or when
    /// no failure handler was set, the built-in responses are used.
    pub fn enable_validation_failure_handler(&mut self, enabled: bool) -> &mut Self {
        self.options.validation_failure_handler_enabled = enabled;
        self
    }

    /// Sets the failure handler. It sees validation failures and handler
    /// errors alike and must produce the response.
    pub fn set_validation_failure_handler<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(FailureContext) -> Response + Send + Sync + 'static,
    {
        self.failure_handler = Some(Arc::new(handler));
        self
    }

    /// Builds the router.
    ///
    /// Operations are registered in declaration order. Those without a
    /// handler are skipped unless handler-less mounting is on.
    pub fn get_router(&self) -> Result<ApiRouter, BuildError> {
        let mut registry = OperationRegistry::new(self.resolved.schemas.clone());

        for (operation, schemas) in self
            .spec
            .operations()
            .iter()
            .zip(self.resolved.operations.iter())
        {
            let handler = self.handlers.get(&operation.id).cloned();
            let mount = handler.is_some() || self.options.mount_operations_without_handlers;
            if handler.is_none() && !mount {
                warn!(operation_id = %operation.id, route = %operation.route(), "operation has no handler and is not mounted");
            }
            registry.register(operation.clone(), schemas.clone(), handler)?;
            if mount {
                registry.mount(&operation.id)?;
            }
        }

        info!(
            operations = registry.len(),
            mounted = registry.mounted_count(),
            "router built"
        );

        let failure_handler = if self.options.validation_failure_handler_enabled {
            self.failure_handler.clone()
        } else {
            None
        };
        Ok(ApiRouter::new(registry, failure_handler))
    }
}

fn check_unique_ids(spec: &Specification) -> Result<(), DuplicateOperationError> {
    let mut seen = HashMap::new();
    for operation in spec.operations() {
        if let Some(first) = seen.insert(operation.id.as_str(), operation.route()) {
            return Err(DuplicateOperationError {
                operation_id: operation.id.clone(),
                first,
                second: operation.route(),
            });
        }
    }
    Ok(())
}

fn in_memory_base() -> Result<Url, BuildError> {
    Url::parse(IN_MEMORY_BASE)
        .map_err(|e| SpecLoadError::invalid(IN_MEMORY_BASE, e.to_string()).into())
}

async fn with_timeout<T>(
    after: std::time::Duration,
    build: impl Future<Output = Result<T, BuildError>>,
) -> Result<T, BuildError> {
    tokio::time::timeout(after, build)
        .await
        .unwrap_or(Err(BuildError::Timeout { after }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid_core::{response, HandlerError, RequestContext};
    use http::StatusCode;

    const SPEC: &str = r#"
openapi: 3.0.0
info:
  title: Pets
  version: "1.0"
paths:
  /pets:
    get:
      operationId: listPets
    post:
      operationId: createPet
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [name]
              properties:
                name: { type: string }
"#;

    async fn ok(_ctx: RequestContext) -> Result<Response, HandlerError> {
        Ok(response::text(StatusCode::OK, "ok"))
    }

    #[tokio::test]
    async fn test_unknown_operation_rejected() {
        let mut factory = RouterFactory::from_str(SPEC, FactoryOptions::default())
            .await
            .unwrap();
        let err = factory
            .add_handler_by_operation_id("deletePet", ok)
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownOperation { ref operation_id } if operation_id == "deletePet"));
    }

    #[tokio::test]
    async fn test_unmounted_without_handler() {
        let mut factory = RouterFactory::from_str(SPEC, FactoryOptions::default())
            .await
            .unwrap();
        factory.add_handler_by_operation_id("listPets", ok).unwrap();

        let router = factory.get_router().unwrap();
        assert!(router.registry().is_mounted("listPets"));
        assert!(!router.registry().is_mounted("createPet"));
        assert_eq!(router.registry().len(), 2);
    }

    #[tokio::test]
    async fn test_mount_policy_applies_at_build() {
        let mut factory = RouterFactory::from_str(SPEC, FactoryOptions::default())
            .await
            .unwrap();
        factory.mount_operations_without_handlers(true);

        let router = factory.get_router().unwrap();
        assert_eq!(router.registry().mounted_count(), 2);
        assert!(router.registry().handler_for("createPet").is_none());
    }

    #[tokio::test]
    async fn test_router_can_be_built_twice() {
        let mut factory = RouterFactory::from_str(SPEC, FactoryOptions::default())
            .await
            .unwrap();
        factory.add_handler_by_operation_id("listPets", ok).unwrap();
        let first = factory.get_router().unwrap();
        factory.mount_operations_without_handlers(true);
        let second = factory.get_router().unwrap();

        assert_eq!(first.registry().mounted_count(), 1);
        assert_eq!(second.registry().mounted_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_operation_id_is_spec_load_error() {
        let spec = "openapi: 3.0.0\npaths:\n  /pets:\n    get:\n      summary: list\n";
        let err = RouterFactory::from_str(spec, FactoryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::SpecLoad(_)));
    }

    #[tokio::test]
    async fn test_duplicate_operation_id() {
        let spec = r#"
openapi: 3.0.0
paths:
  /pets:
    get:
      operationId: listPets
  /animals:
    get:
      operationId: listPets
"#;
        let err = RouterFactory::from_str(spec, FactoryOptions::default())
            .await
            .unwrap_err();
        match err {
            BuildError::DuplicateOperation(dup) => {
                assert_eq!(dup.operation_id, "listPets");
                assert_eq!(dup.first, "GET /pets");
                assert_eq!(dup.second, "GET /animals");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_from_value() {
        let doc = serde_json::json!({
            "openapi": "3.1.0",
            "paths": { "/health": { "get": { "operationId": "health" } } }
        });
        let factory = RouterFactory::from_value(doc, FactoryOptions::default())
            .await
            .unwrap();
        assert_eq!(factory.specification().operations().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_spec_load_error() {
        let err = RouterFactory::from_file("/nonexistent/openapi.yaml", FactoryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::SpecLoad(SpecLoadError::Io { .. })));
    }

    #[tokio::test]
    async fn test_build_timeout() {
        let err = with_timeout(std::time::Duration::from_millis(10), async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok::<(), BuildError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, BuildError::Timeout { .. }));
    }
}

//! Operation registry.
//!
//! Maps operation ids to their compiled schemas and handlers, and
//! `(method, path)` pairs to mounted operations. Populated once while the
//! router is built and read-only afterwards.

use std::collections::HashMap;
use std::fmt;

use euclid_core::{BoxedHandler, BuildError, DuplicateOperationError, SpecLoadError};
use euclid_router::{Params, RouteError, RouteLookup, Router};
use euclid_schema::SchemaSet;
use http::Method;
use tracing::debug;

use crate::operation::Operation;
use crate::spec::OperationSchemas;

/// An operation with its compiled schemas and optional handler.
pub struct RegisteredOperation {
    operation: Operation,
    schemas: OperationSchemas,
    handler: Option<BoxedHandler>,
    mounted: bool,
}

impl RegisteredOperation {
    /// Returns the operation.
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Returns the compiled schemas.
    #[must_use]
    pub fn schemas(&self) -> &OperationSchemas {
        &self.schemas
    }

    /// Returns the bound handler.
    #[must_use]
    pub fn handler(&self) -> Option<&BoxedHandler> {
        self.handler.as_ref()
    }

    /// Returns true if requests can reach this operation.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl fmt::Debug for RegisteredOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredOperation")
            .field("operation", &self.operation.id)
            .field("route", &self.operation.route())
            .field("has_handler", &self.handler.is_some())
            .field("mounted", &self.mounted)
            .finish()
    }
}

/// Result of [`OperationRegistry::lookup`].
#[derive(Debug)]
pub enum Lookup<'a> {
    /// A mounted operation matched path and method.
    Found {
        /// The matched operation.
        entry: &'a RegisteredOperation,
        /// Values captured from the path template.
        params: Params,
    },
    /// The path matched but the method did not.
    MethodNotAllowed(Vec<Method>),
    /// Nothing matched.
    NotFound,
}

/// Operations by id and by route.
#[derive(Debug)]
pub struct OperationRegistry {
    schemas: SchemaSet,
    entries: Vec<RegisteredOperation>,
    index: HashMap<String, usize>,
    routes: Router<usize>,
}

impl OperationRegistry {
    /// Creates an empty registry over compiled schemas.
    #[must_use]
    pub fn new(schemas: SchemaSet) -> Self {
        Self {
            schemas,
            entries: Vec::new(),
            index: HashMap::new(),
            routes: Router::new(),
        }
    }

    /// Adds an operation. It is not routable until [`mount`](Self::mount)ed.
    pub fn register(
        &mut self,
        operation: Operation,
        schemas: OperationSchemas,
        handler: Option<BoxedHandler>,
    ) -> Result<(), DuplicateOperationError> {
        if let Some(&existing) = self.index.get(&operation.id) {
            return Err(DuplicateOperationError {
                operation_id: operation.id.clone(),
                first: self.entries[existing].operation.route(),
                second: operation.route(),
            });
        }
        self.index.insert(operation.id.clone(), self.entries.len());
        self.entries.push(RegisteredOperation {
            operation,
            schemas,
            handler,
            mounted: false,
        });
        Ok(())
    }

    /// Adds the operation's route to the dispatch table.
    pub fn mount(&mut self, operation_id: &str) -> Result<(), BuildError> {
        let &slot = self
            .index
            .get(operation_id)
            .ok_or_else(|| BuildError::UnknownOperation {
                operation_id: operation_id.to_string(),
            })?;
        let entry = &mut self.entries[slot];
        if entry.mounted {
            return Ok(());
        }

        self.routes
            .route(entry.operation.method.clone(), &entry.operation.path, slot)
            .map_err(|e| match e {
                RouteError::Conflict { .. } => BuildError::DuplicateRoute {
                    message: format!("{e} (operation '{operation_id}')"),
                },
                other => BuildError::SpecLoad(SpecLoadError::invalid(
                    &entry.operation.pointer,
                    other.to_string(),
                )),
            })?;
        entry.mounted = true;
        debug!(operation_id, route = %entry.operation.route(), "mounted operation");
        Ok(())
    }

    /// Resolves a request to a mounted operation.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        match self.routes.lookup(method, path) {
            RouteLookup::Found(found) => Lookup::Found {
                entry: &self.entries[*found.value],
                params: found.params,
            },
            RouteLookup::MethodNotAllowed(allowed) => Lookup::MethodNotAllowed(allowed),
            RouteLookup::NotFound => Lookup::NotFound,
        }
    }

    /// Returns a registered operation by id.
    #[must_use]
    pub fn get(&self, operation_id: &str) -> Option<&RegisteredOperation> {
        self.index.get(operation_id).map(|&i| &self.entries[i])
    }

    /// Returns an operation by id.
    #[must_use]
    pub fn operation(&self, operation_id: &str) -> Option<&Operation> {
        self.get(operation_id).map(RegisteredOperation::operation)
    }

    /// Iterates over operations in registration order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.entries.iter().map(RegisteredOperation::operation)
    }

    /// Returns the handler bound to an operation.
    #[must_use]
    pub fn handler_for(&self, operation_id: &str) -> Option<&BoxedHandler> {
        self.get(operation_id).and_then(RegisteredOperation::handler)
    }

    /// Returns true if the operation is routable.
    #[must_use]
    pub fn is_mounted(&self, operation_id: &str) -> bool {
        self.get(operation_id).is_some_and(RegisteredOperation::is_mounted)
    }

    /// Returns the compiled schemas.
    #[must_use]
    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no operation is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of routable operations.
    #[must_use]
    pub fn mounted_count(&self) -> usize {
        self.routes.len()
    }
}

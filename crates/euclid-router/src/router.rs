//! Dispatch table API.

use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::{RouteLookup, RouteMatch};

/// A radix tree dispatch table keyed by path template and method.
///
/// Templates use OpenAPI syntax (`/pets/{petId}`) plus a trailing `*name`
/// catch-all. When several templates match a path, static segments win over
/// parameters, and parameters win over wildcards.
///
/// # Example
///
/// ```rust
/// use euclid_router::{MethodRouter, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert("/pets", MethodRouter::new().get("listPets")).unwrap();
/// router.route(Method::GET, "/pets/{petId}", "showPetById").unwrap();
///
/// let found = router.match_route(&Method::GET, "/pets/7").unwrap();
/// assert_eq!(*found.value, "showPetById");
/// assert_eq!(found.params.get("petId"), Some("7"));
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty dispatch table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts every entry of `methods` under `path`.
    ///
    /// Fails if any method is already registered for an equivalent template.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), RouteError> {
        let added = methods.allowed_methods().len();
        self.root.insert(path, methods)?;
        self.route_count += added;
        Ok(())
    }

    /// Inserts a single `(method, path)` entry.
    pub fn route(&mut self, method: Method, path: &str, value: T) -> Result<(), RouteError> {
        self.insert(path, MethodRouter::new().on(method, value))
    }

    /// Resolves a request to its entry, if both path and method match.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        match self.lookup(method, path) {
            RouteLookup::Found(found) => Some(found),
            _ => None,
        }
    }

    /// Resolves a request and tells a missing path apart from a wrong method.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_, T> {
        let Some((methods, params)) = self.root.match_path(path) else {
            return RouteLookup::NotFound;
        };
        match methods.at(method) {
            Some(value) => RouteLookup::Found(RouteMatch::new(value, params)),
            None => RouteLookup::MethodNotAllowed(methods.allowed_methods()),
        }
    }

    /// Matches a path regardless of method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of `(method, path)` entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pets() -> Router<&'static str> {
        let mut router = Router::new();
        router
            .insert("/pets", MethodRouter::new().get("listPets").post("createPet"))
            .unwrap();
        router.route(Method::GET, "/pets/{petId}", "showPetById").unwrap();
        router.route(Method::DELETE, "/pets/{petId}", "deletePet").unwrap();
        router
    }

    #[test]
    fn test_len_counts_method_entries() {
        let router = pets();
        assert_eq!(router.len(), 4);
        assert!(!router.is_empty());
        assert!(Router::<u8>::new().is_empty());
    }

    #[test]
    fn test_lookup_found() {
        let router = pets();
        let RouteLookup::Found(found) = router.lookup(&Method::DELETE, "/pets/3") else {
            panic!("expected a match");
        };
        assert_eq!(*found.value, "deletePet");
        assert_eq!(found.params.get("petId"), Some("3"));
    }

    #[test]
    fn test_lookup_method_not_allowed_lists_methods() {
        let router = pets();
        assert_eq!(
            router.lookup(&Method::PUT, "/pets"),
            RouteLookup::MethodNotAllowed(vec![Method::GET, Method::POST])
        );
    }

    #[test]
    fn test_lookup_not_found() {
        let router = pets();
        assert_eq!(router.lookup(&Method::GET, "/owners"), RouteLookup::NotFound);
        assert!(router.match_route(&Method::GET, "/pets/1/toys").is_none());
    }

    #[test]
    fn test_duplicate_route_rejected_and_not_counted() {
        let mut router = pets();
        let err = router.route(Method::GET, "/pets/{petId}", "again").unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));
        assert_eq!(router.len(), 4);
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let router = pets();
        assert_eq!(*router.match_route(&Method::GET, "/pets/").unwrap().value, "listPets");
    }

    #[test]
    fn test_root_path() {
        let mut router = Router::new();
        router.route(Method::GET, "/", "root").unwrap();
        assert_eq!(*router.match_route(&Method::GET, "/").unwrap().value, "root");
    }
}

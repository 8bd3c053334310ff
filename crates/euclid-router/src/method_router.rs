//! Per-path method table.
//!
//! A [`MethodRouter`] holds the entries registered for one path template,
//! keyed by HTTP method. Any method the `http` crate can represent is
//! accepted, including extension methods.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to entries for a single path template.
///
/// # Example
///
/// ```rust
/// use euclid_router::MethodRouter;
/// use http::Method;
///
/// let methods = MethodRouter::new()
///     .get("listPets")
///     .post("createPet");
///
/// assert_eq!(methods.at(&Method::GET), Some(&"listPets"));
/// assert_eq!(methods.at(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    entries: SmallVec<[(Method, T); 2]>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` for `method`, replacing any earlier entry.
    #[must_use]
    pub fn on(mut self, method: Method, value: T) -> Self {
        if let Some(slot) = self.entries.iter_mut().find(|(m, _)| *m == method) {
            slot.1 = value;
        } else {
            self.entries.push((method, value));
        }
        self
    }

    /// Registers a GET entry.
    #[must_use]
    pub fn get(self, value: T) -> Self {
        self.on(Method::GET, value)
    }

    /// Registers a POST entry.
    #[must_use]
    pub fn post(self, value: T) -> Self {
        self.on(Method::POST, value)
    }

    /// Registers a PUT entry.
    #[must_use]
    pub fn put(self, value: T) -> Self {
        self.on(Method::PUT, value)
    }

    /// Registers a DELETE entry.
    #[must_use]
    pub fn delete(self, value: T) -> Self {
        self.on(Method::DELETE, value)
    }

    /// Registers a PATCH entry.
    #[must_use]
    pub fn patch(self, value: T) -> Self {
        self.on(Method::PATCH, value)
    }

    /// Returns the entry registered for `method`.
    #[must_use]
    pub fn at(&self, method: &Method) -> Option<&T> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, v)| v)
    }

    /// Moves every entry of `other` into this table.
    ///
    /// Fails without changing anything if a method is registered in both
    /// tables, returning that method.
    pub fn merge(&mut self, other: MethodRouter<T>) -> Result<(), Method> {
        if let Some((method, _)) = other.entries.iter().find(|(m, _)| self.at(m).is_some()) {
            return Err(method.clone());
        }
        self.entries.extend(other.entries);
        Ok(())
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lists the registered methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_register_by_method() {
        let methods = MethodRouter::new()
            .get(1)
            .post(2)
            .put(3)
            .delete(4)
            .patch(5);

        assert_eq!(methods.at(&Method::GET), Some(&1));
        assert_eq!(methods.at(&Method::POST), Some(&2));
        assert_eq!(methods.at(&Method::PUT), Some(&3));
        assert_eq!(methods.at(&Method::DELETE), Some(&4));
        assert_eq!(methods.at(&Method::PATCH), Some(&5));
        assert_eq!(methods.at(&Method::HEAD), None);
    }

    #[test]
    fn test_on_replaces_existing_entry() {
        let methods = MethodRouter::new().get("old").on(Method::GET, "new");
        assert_eq!(methods.at(&Method::GET), Some(&"new"));
        assert_eq!(methods.allowed_methods(), vec![Method::GET]);
    }

    #[test]
    fn test_extension_method() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let methods = MethodRouter::new().on(purge.clone(), "purgeCache");
        assert_eq!(methods.at(&purge), Some(&"purgeCache"));
    }

    #[test]
    fn test_merge_disjoint_tables() {
        let mut methods = MethodRouter::new().get("listPets");
        methods.merge(MethodRouter::new().post("createPet")).unwrap();

        assert_eq!(methods.at(&Method::POST), Some(&"createPet"));
        assert_eq!(methods.allowed_methods(), vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_merge_reports_conflicting_method() {
        let mut methods = MethodRouter::new().get("listPets");
        let conflict = methods.merge(MethodRouter::new().get("searchPets"));

        assert_eq!(conflict, Err(Method::GET));
        assert_eq!(methods.at(&Method::GET), Some(&"listPets"));
    }

    #[test]
    fn test_empty_table() {
        let methods: MethodRouter<u8> = MethodRouter::new();
        assert!(methods.is_empty());
        assert!(methods.allowed_methods().is_empty());
    }
}

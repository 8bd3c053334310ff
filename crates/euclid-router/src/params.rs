//! Path parameters captured while walking the tree.

use smallvec::SmallVec;

/// Parameters kept inline before spilling to the heap.
const INLINE_PARAMS: usize = 4;

/// Path parameters captured by a route match, in template order.
///
/// Values are the raw path segments; percent-decoding is left to the caller
/// so that parameter schemas see exactly what the client sent.
///
/// # Example
///
/// ```rust
/// use euclid_router::Params;
///
/// let mut params = Params::new();
/// params.push("petId", "42");
///
/// assert_eq!(params.get("petId"), Some("42"));
/// assert_eq!(params.get("ownerId"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Drops every parameter captured after the first `len`.
    ///
    /// Used to undo captures when a branch of the tree fails to match.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

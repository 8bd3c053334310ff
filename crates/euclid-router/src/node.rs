//! Radix tree node.
//!
//! Each node is one path segment. Children are tried static first, then the
//! single parameter child, then the wildcard child.

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Kind of path segment held by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment such as `pets`.
    Static,
    /// Template parameter such as `{petId}`.
    Param(String),
    /// Catch-all such as `*rest`.
    Wildcard(String),
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// Segment text as written in the template.
    pub segment: String,

    /// Segment kind.
    pub kind: SegmentKind,

    /// Entries for templates ending at this node.
    pub methods: Option<MethodRouter<T>>,

    /// Static children sorted by segment for binary search.
    pub static_children: Vec<Node<T>>,

    /// Parameter child.
    pub param_child: Option<Box<Node<T>>>,

    /// Wildcard child, always a leaf.
    pub wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::with_kind(String::new(), SegmentKind::Static)
    }

    /// Inserts the entries of `methods` under `path`.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), RouteError> {
        let segments = parse_path(path)?;
        self.insert_segments(path, &segments, methods)
    }

    fn insert_segments(
        &mut self,
        path: &str,
        segments: &[(String, SegmentKind)],
        methods: MethodRouter<T>,
    ) -> Result<(), RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            return self.attach(path, methods);
        };

        match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(
                            index,
                            Node::with_kind(segment.clone(), SegmentKind::Static),
                        );
                        index
                    }
                };
                self.static_children[index].insert_segments(path, remaining, methods)
            }
            SegmentKind::Param(name) => {
                let child = self.param_child.get_or_insert_with(|| {
                    Box::new(Node::with_kind(segment.clone(), kind.clone()))
                });
                if let SegmentKind::Param(existing) = &child.kind {
                    if existing != name {
                        return Err(RouteError::ParamNameMismatch {
                            path: path.to_string(),
                            existing: existing.clone(),
                            found: name.clone(),
                        });
                    }
                }
                child.insert_segments(path, remaining, methods)
            }
            SegmentKind::Wildcard(_) => {
                if !remaining.is_empty() {
                    return Err(RouteError::WildcardNotLast {
                        path: path.to_string(),
                    });
                }
                let child = self.wildcard_child.get_or_insert_with(|| {
                    Box::new(Node::with_kind(segment.clone(), kind.clone()))
                });
                child.attach(path, methods)
            }
        }
    }

    fn attach(&mut self, path: &str, methods: MethodRouter<T>) -> Result<(), RouteError> {
        match &mut self.methods {
            Some(existing) => existing
                .merge(methods)
                .map_err(|method| RouteError::Conflict {
                    method,
                    path: path.to_string(),
                }),
            None => {
                self.methods = Some(methods);
                Ok(())
            }
        }
    }

    /// Matches a concrete request path.
    ///
    /// Returns the method table of the best matching template together with
    /// the parameters captured along the way.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                let methods = child.methods.as_ref()?;
                params.push(name.clone(), segments.join("/"));
                return Some(methods);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

/// Splits a template into typed segments.
fn parse_path(path: &str) -> Result<Vec<(String, SegmentKind)>, RouteError> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if let Some(name) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid_segment(path, s));
                }
                Ok((s.to_string(), SegmentKind::Param(name.to_string())))
            } else if let Some(name) = s.strip_prefix('*') {
                Ok((s.to_string(), SegmentKind::Wildcard(name.to_string())))
            } else if s.contains(['{', '}']) {
                Err(invalid_segment(path, s))
            } else {
                Ok((s.to_string(), SegmentKind::Static))
            }
        })
        .collect()
}

fn invalid_segment(path: &str, segment: &str) -> RouteError {
    RouteError::InvalidSegment {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn op<'a>(root: &'a Node<&'static str>, path: &str) -> Option<(&'a str, Params)> {
        let (methods, params) = root.match_path(path)?;
        methods.at(&Method::GET).map(|v| (*v, params))
    }

    #[test]
    fn test_parse_path_kinds() {
        let segments = parse_path("/files/{id}/*rest").unwrap();
        assert_eq!(segments[0], ("files".to_string(), SegmentKind::Static));
        assert_eq!(
            segments[1],
            ("{id}".to_string(), SegmentKind::Param("id".to_string()))
        );
        assert_eq!(
            segments[2],
            ("*rest".to_string(), SegmentKind::Wildcard("rest".to_string()))
        );
    }

    #[test]
    fn test_parse_path_rejects_partial_template() {
        let err = parse_path("/reports/{id}.json").unwrap_err();
        assert!(matches!(err, RouteError::InvalidSegment { segment, .. } if segment == "{id}.json"));
    }

    #[test]
    fn test_static_children_stay_sorted() {
        let mut root = Node::root();
        for path in ["/zebra", "/apple", "/mango"] {
            root.insert(path, MethodRouter::new().get("x")).unwrap();
        }
        let order: Vec<_> = root.static_children.iter().map(|c| c.segment.as_str()).collect();
        assert_eq!(order, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        root.insert("/pets/mine", MethodRouter::new().get("listMine")).unwrap();
        root.insert("/pets/{petId}", MethodRouter::new().get("getPet")).unwrap();

        assert_eq!(op(&root, "/pets/mine").unwrap().0, "listMine");
        let (id, params) = op(&root, "/pets/12").unwrap();
        assert_eq!(id, "getPet");
        assert_eq!(params.get("petId"), Some("12"));
    }

    #[test]
    fn test_backtracking_drops_stale_params() {
        let mut root = Node::root();
        root.insert("/a/b/{y}/z", MethodRouter::new().get("staticThenParam")).unwrap();
        root.insert("/a/{x}/c/w", MethodRouter::new().get("paramThenStatic")).unwrap();

        // The static "b" branch captures y before failing on "w".
        let (id, params) = op(&root, "/a/b/c/w").unwrap();
        assert_eq!(id, "paramThenStatic");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("x", "b")]);

        let (id, params) = op(&root, "/a/b/c/z").unwrap();
        assert_eq!(id, "staticThenParam");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("y", "c")]);
    }

    #[test]
    fn test_param_branch_failure_falls_back_to_wildcard() {
        let mut root = Node::root();
        root.insert("/files/{name}/meta", MethodRouter::new().get("meta")).unwrap();
        root.insert("/files/*rest", MethodRouter::new().get("raw")).unwrap();

        let (id, params) = op(&root, "/files/a/b").unwrap();
        assert_eq!(id, "raw");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("rest"), Some("a/b"));
    }

    #[test]
    fn test_intermediate_node_without_methods_does_not_match() {
        let mut root = Node::root();
        root.insert("/pets/{petId}", MethodRouter::new().get("getPet")).unwrap();
        assert!(root.match_path("/pets").is_none());
    }

    #[test]
    fn test_duplicate_method_is_conflict() {
        let mut root = Node::root();
        root.insert("/pets", MethodRouter::new().get("a")).unwrap();
        let err = root.insert("/pets/", MethodRouter::new().get("b")).unwrap_err();
        assert_eq!(
            err,
            RouteError::Conflict {
                method: Method::GET,
                path: "/pets/".to_string()
            }
        );
    }

    #[test]
    fn test_param_name_mismatch() {
        let mut root = Node::root();
        root.insert("/pets/{petId}", MethodRouter::new().get("a")).unwrap();
        let err = root
            .insert("/pets/{name}/toys", MethodRouter::new().get("b"))
            .unwrap_err();
        assert!(matches!(err, RouteError::ParamNameMismatch { .. }));
    }

    #[test]
    fn test_wildcard_must_be_last() {
        let mut root: Node<&str> = Node::root();
        let err = root
            .insert("/files/*rest/meta", MethodRouter::new().get("x"))
            .unwrap_err();
        assert!(matches!(err, RouteError::WildcardNotLast { .. }));
    }
}

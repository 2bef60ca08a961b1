//! Segment radix tree behind [`RouteTable`](super::RouteTable).
//!
//! Each node owns its literal children and at most one parameter child. Routes live on
//! terminal nodes, keyed by verb. Search walks literal children first and backtracks into
//! the parameter child when the literal subtree yields no route for the verb, so
//! `/products/featured` wins over `/products/{productID}`.

use super::core::RouteEntry;
use super::method_set::MethodSet;
use crate::error::CompileError;
use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    /// Render segments back to a pattern such as `/products/{productID}`.
    pub(crate) fn render(segments: &[Segment]) -> String {
        if segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for s in segments {
            out.push('/');
            match s {
                Segment::Literal(l) => out.push_str(l),
                Segment::Param(p) => {
                    out.push('{');
                    out.push_str(p);
                    out.push('}');
                }
            }
        }
        out
    }
}

/// Captured `(name, value)` pairs, in pattern order.
pub(crate) type Captures<'a> = SmallVec<[(&'a str, &'a str); 4]>;

#[derive(Debug, Default)]
pub(crate) struct RadixNode {
    literals: Vec<(String, RadixNode)>,
    param: Option<(String, Box<RadixNode>)>,
    routes: HashMap<Method, Arc<RouteEntry>>,
    methods: MethodSet,
}

impl RadixNode {
    /// Insert `route` under `segments`. `depth` is the index of the current segment.
    pub(crate) fn insert(
        &mut self,
        segments: &[Segment],
        depth: usize,
        route: Arc<RouteEntry>,
    ) -> Result<(), CompileError> {
        let Some(segment) = segments.get(depth) else {
            if self.routes.contains_key(&route.method) {
                return Err(CompileError::DuplicateRoute {
                    method: route.method.clone(),
                    pattern: route.pattern.clone(),
                });
            }
            self.methods.insert(&route.method);
            self.routes.insert(route.method.clone(), route);
            return Ok(());
        };

        match segment {
            Segment::Literal(lit) => {
                let idx = match self.literals.iter().position(|(s, _)| s == lit) {
                    Some(i) => i,
                    None => {
                        self.literals.push((lit.clone(), RadixNode::default()));
                        self.literals.len() - 1
                    }
                };
                self.literals[idx].1.insert(segments, depth + 1, route)
            }
            Segment::Param(name) => {
                if let Some((existing, child)) = &mut self.param {
                    if existing.as_str() != name.as_str() {
                        return Err(CompileError::AmbiguousTemplate {
                            location: Segment::render(&segments[..depth]),
                            existing: existing.clone(),
                            conflicting: name.clone(),
                        });
                    }
                    return child.insert(segments, depth + 1, route);
                }
                let mut child = Box::<RadixNode>::default();
                child.insert(segments, depth + 1, route)?;
                self.param = Some((name.clone(), child));
                Ok(())
            }
        }
    }

    /// Find the route for `method` under `path`. Every node the full path reaches adds its
    /// verbs to `allowed`, so a miss can be told apart as 404 or 405.
    pub(crate) fn search<'a>(
        &'a self,
        path: &[&'a str],
        method: &Method,
        captures: &mut Captures<'a>,
        allowed: &mut MethodSet,
    ) -> Option<&'a Arc<RouteEntry>> {
        let Some((segment, rest)) = path.split_first() else {
            *allowed = allowed.union(self.methods);
            return self.routes.get(method);
        };

        if let Some((_, child)) = self.literals.iter().find(|(s, _)| s.as_str() == *segment) {
            if let Some(route) = child.search(rest, method, captures, allowed) {
                return Some(route);
            }
        }

        if let Some((name, child)) = &self.param {
            if !segment.is_empty() {
                captures.push((name.as_str(), *segment));
                if let Some(route) = child.search(rest, method, captures, allowed) {
                    return Some(route);
                }
                // backtrack
                captures.pop();
            }
        }

        None
    }
}

use super::method_set::MethodSet;
use super::radix::{Captures, RadixNode, Segment};
use crate::error::CompileError;
use crate::spec::{slugify, BodySpec, Parameter, Resource, Specification};
use http::Method;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A declared parameter together with its compiled `pattern` facet.
#[derive(Debug, Clone)]
pub struct ParamRule {
    pub param: Parameter,
    pub regex: Option<Regex>,
}

impl ParamRule {
    fn compile(param: Parameter) -> Result<Self, CompileError> {
        let regex = match &param.pattern {
            Some(p) => Some(anchored(p).map_err(|source| CompileError::InvalidPattern {
                parameter: param.name.clone(),
                pattern: p.clone(),
                source,
            })?),
            None => None,
        };
        Ok(Self { param, regex })
    }
}

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

/// One compiled route: a verb on a full pattern, bound to a handler.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    /// Full pattern including the base path, e.g. `/v1/products/{productID}`
    pub pattern: String,
    pub handler_name: String,
    /// Path parameter extraction points as `(segment index, name)`
    pub extraction_points: Vec<(usize, String)>,
    pub uri_params: Vec<ParamRule>,
    pub query_params: Vec<ParamRule>,
    pub headers: Vec<ParamRule>,
    pub body: Option<BodySpec>,
}

/// A successful lookup: the route plus the captured, percent-decoded path parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteEntry>,
    pub path_params: HashMap<String, String>,
}

impl RouteMatch {
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.route.handler_name
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub enum RouteLookup {
    Matched(RouteMatch),
    /// The path exists but not for this verb; carries the verbs that are allowed.
    MethodNotAllowed(MethodSet),
    NotFound,
}

/// Compiled, immutable route table. Share it behind an `Arc`; lookups take `&self`.
#[derive(Debug)]
pub struct RouteTable {
    root: RadixNode,
    entries: Vec<Arc<RouteEntry>>,
    base_path: String,
    /// Handler name -> (first pattern bound to it, whether the name was derived)
    bindings: HashMap<String, (String, bool)>,
}

impl RouteTable {
    /// Compile a Specification into a route table.
    ///
    /// Resources are walked depth-first; each method becomes exactly one entry keyed by
    /// `(verb, full pattern)`.
    ///
    /// # Errors
    ///
    /// - [`CompileError::DuplicateRoute`] when two methods share a verb and pattern
    /// - [`CompileError::AmbiguousTemplate`] when sibling templates use different names
    /// - [`CompileError::DuplicateParameter`] when a pattern repeats a template name
    /// - [`CompileError::HandlerNameCollision`] when a derived handler name would be shared
    ///   with a different pattern
    /// - [`CompileError::InvalidSegment`] for segments like `item-{id}`
    /// - [`CompileError::InvalidPattern`] for a `pattern` facet that is not a valid regex
    pub fn compile(spec: &Specification) -> Result<Self, CompileError> {
        let mut table = RouteTable {
            root: RadixNode::default(),
            entries: Vec::with_capacity(spec.method_count()),
            base_path: spec.base_path.clone(),
            bindings: HashMap::new(),
        };

        let mut prefix = parse_segments(&spec.base_path, &spec.base_path)?;
        let mut inherited = Vec::new();
        for resource in &spec.resources {
            table.add_resource(resource, &mut prefix, &mut inherited)?;
        }

        let routes_summary: Vec<String> = table
            .entries
            .iter()
            .take(10)
            .map(|e| format!("{} {}", e.method, e.pattern))
            .collect();
        info!(
            routes_count = table.entries.len(),
            base_path = %table.base_path,
            routes_summary = ?routes_summary,
            "Route table compiled"
        );
        Ok(table)
    }

    fn add_resource(
        &mut self,
        resource: &Resource,
        prefix: &mut Vec<Segment>,
        inherited: &mut Vec<Parameter>,
    ) -> Result<(), CompileError> {
        let depth = prefix.len();
        let declared = inherited.len();
        let location = match Segment::render(prefix).as_str() {
            "/" => resource.relative_uri.clone(),
            base => format!("{base}{}", resource.relative_uri),
        };
        let own = parse_segments(&resource.relative_uri, &location)?;
        prefix.extend(own);
        inherited.extend(resource.uri_parameters.iter().cloned());

        for method in &resource.methods {
            let pattern = Segment::render(prefix);
            let derived = method.handler.is_none();
            let handler_name = method.handler.clone().unwrap_or_else(|| {
                let verb = method.method.as_str().to_ascii_lowercase();
                slugify(&format!("{verb} {pattern}"))
            });

            let mut extraction_points: Vec<(usize, String)> = Vec::new();
            let mut uri_params = Vec::new();
            for (i, seg) in prefix.iter().enumerate() {
                if let Segment::Param(name) = seg {
                    if extraction_points.iter().any(|(_, seen)| seen == name) {
                        return Err(CompileError::DuplicateParameter {
                            pattern,
                            name: name.clone(),
                        });
                    }
                    extraction_points.push((i, name.clone()));
                    let param = inherited
                        .iter()
                        .rev()
                        .find(|p| &p.name == name)
                        .cloned()
                        .unwrap_or_else(|| Parameter::implicit_path(name));
                    uri_params.push(ParamRule::compile(param)?);
                }
            }

            let entry = Arc::new(RouteEntry {
                method: method.method.clone(),
                pattern,
                handler_name,
                extraction_points,
                uri_params,
                query_params: compile_rules(&method.query_parameters)?,
                headers: compile_rules(&method.headers)?,
                body: method.body.clone(),
            });
            self.root.insert(prefix, 0, Arc::clone(&entry))?;
            self.bind_handler(&entry, derived)?;
            debug!(
                method = %entry.method,
                pattern = %entry.pattern,
                handler_name = %entry.handler_name,
                "Route compiled"
            );
            self.entries.push(entry);
        }

        for child in &resource.children {
            self.add_resource(child, prefix, inherited)?;
        }

        prefix.truncate(depth);
        inherited.truncate(declared);
        Ok(())
    }

    /// Explicit names may be shared freely; a derived name must stay on one pattern.
    fn bind_handler(&mut self, entry: &RouteEntry, derived: bool) -> Result<(), CompileError> {
        match self.bindings.get_mut(&entry.handler_name) {
            None => {
                self.bindings.insert(
                    entry.handler_name.clone(),
                    (entry.pattern.clone(), derived),
                );
                Ok(())
            }
            Some((existing, existing_derived)) => {
                if *existing != entry.pattern && (derived || *existing_derived) {
                    return Err(CompileError::HandlerNameCollision {
                        handler: entry.handler_name.clone(),
                        pattern: entry.pattern.clone(),
                        existing: existing.clone(),
                    });
                }
                *existing_derived |= derived;
                Ok(())
            }
        }
    }

    /// Match a request. The path is normalized first; a query string, if any, is ignored.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let normalized = normalize_path(path);
        let decoded: Vec<Cow<'_, str>> = normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).unwrap_or(Cow::Borrowed(s)))
            .collect();
        let segments: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();

        let mut captures = Captures::new();
        let mut allowed = MethodSet::empty();
        match self
            .root
            .search(&segments, method, &mut captures, &mut allowed)
        {
            Some(route) => {
                let path_params: HashMap<String, String> = captures
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect();
                info!(
                    method = %method,
                    path = %normalized,
                    handler_name = %route.handler_name,
                    route_pattern = %route.pattern,
                    path_params = ?path_params,
                    "Route matched"
                );
                RouteLookup::Matched(RouteMatch {
                    route: Arc::clone(route),
                    path_params,
                })
            }
            None if !allowed.is_empty() => {
                warn!(
                    method = %method,
                    path = %normalized,
                    allowed = %allowed,
                    "Method not allowed"
                );
                RouteLookup::MethodNotAllowed(allowed)
            }
            None => {
                warn!(method = %method, path = %normalized, "No route matched");
                RouteLookup::NotFound
            }
        }
    }

    /// Compiled entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[Arc<RouteEntry>] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Print all compiled routes to stdout.
    pub fn dump_routes(&self) {
        println!(
            "[routes] base_path={} count={}",
            if self.base_path.is_empty() { "/" } else { &self.base_path },
            self.entries.len()
        );
        for entry in &self.entries {
            println!(
                "[route] {:<7} {} -> {}",
                entry.method.as_str(),
                entry.pattern,
                entry.handler_name
            );
        }
    }
}

fn compile_rules(params: &[Parameter]) -> Result<Vec<ParamRule>, CompileError> {
    params.iter().cloned().map(ParamRule::compile).collect()
}

fn parse_segments(uri: &str, pattern: &str) -> Result<Vec<Segment>, CompileError> {
    uri.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let inner = s.strip_prefix('{').and_then(|r| r.strip_suffix('}'));
            match inner {
                Some(name) if !name.is_empty() && !name.contains(['{', '}']) => {
                    Ok(Segment::Param(name.to_string()))
                }
                None if !s.contains(['{', '}']) => Ok(Segment::Literal(s.to_string())),
                _ => Err(CompileError::InvalidSegment {
                    pattern: pattern.to_string(),
                    segment: s.to_string(),
                }),
            }
        })
        .collect()
}

/// Collapse repeated `/` and strip a trailing `/` except for the root path.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for seg in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(seg);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

use super::types::{
    BodySpec, MethodSpec, ParamType, Parameter, ParameterLocation, Protocol, RamlVersion,
    Resource, Specification,
};
use crate::error::ParseError;
use http::Method;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

const ROOT_KEYS: [&str; 17] = [
    "title",
    "version",
    "baseUri",
    "protocols",
    "mediaType",
    "description",
    "documentation",
    "schemas",
    "types",
    "traits",
    "resourceTypes",
    "securitySchemes",
    "securedBy",
    "baseUriParameters",
    "annotationTypes",
    "uses",
    "usage",
];

const RESOURCE_KEYS: [&str; 8] = [
    "displayName",
    "description",
    "uriParameters",
    "baseUriParameters",
    "is",
    "type",
    "securedBy",
    "usage",
];

const METHOD_KEYS: [&str; 11] = [
    "displayName",
    "description",
    "queryParameters",
    "headers",
    "body",
    "responses",
    "is",
    "securedBy",
    "protocols",
    "queryString",
    "baseUriParameters",
];

/// Annotation that binds a method to a named handler.
const HANDLER_ANNOTATION: &str = "(handler)";

/// Nested `!include` chains deeper than this are treated as cycles.
const MAX_INCLUDE_DEPTH: usize = 16;

struct Ctx {
    version: RamlVersion,
    media_type: Option<String>,
}

/// Parse RAML text into a [`Specification`]. `base_dir` anchors relative `!include` paths.
pub fn parse_raml(content: &str, base_dir: &Path) -> Result<Specification, ParseError> {
    let version = parse_header(content)?;
    let mut root: Value = serde_yaml::from_str(content)?;
    resolve_includes(&mut root, base_dir, 0)?;

    let map = match &root {
        Value::Mapping(m) => m,
        _ => return Err(ParseError::MissingTitle),
    };

    let mut title = None;
    let mut api_version = None;
    let mut base_uri = None;
    let mut protocols = None;
    let mut media_type = None;

    // Root directives first: resources need the default media type.
    for (k, v) in map {
        let key = key_str(k, "root")?;
        if key.starts_with('/') || is_annotation(key) {
            continue;
        }
        match key {
            "title" => title = Some(scalar_string(v, "title")?),
            "version" => api_version = Some(scalar_string(v, "version")?),
            "baseUri" => base_uri = Some(scalar_string(v, "baseUri")?),
            "protocols" => protocols = Some(parse_protocols(v)?),
            "mediaType" => media_type = first_string(v),
            k if ROOT_KEYS.contains(&k) => {}
            _ => {
                return Err(ParseError::UnknownDirective {
                    location: "root".to_string(),
                    key: key.to_string(),
                })
            }
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or(ParseError::MissingTitle)?;

    let ctx = Ctx {
        version,
        media_type: media_type.clone(),
    };

    let mut resources = Vec::new();
    for (k, v) in map {
        let key = key_str(k, "root")?;
        if key.starts_with('/') {
            resources.push(parse_resource(key, v, &ctx, "")?);
        }
    }

    let base_uri = base_uri.map(|uri| match &api_version {
        Some(v) => uri.replace("{version}", v),
        None => uri,
    });
    let base_path = base_uri.as_deref().map(base_path_of).unwrap_or_default();
    let protocols = protocols
        .or_else(|| base_uri.as_deref().and_then(scheme_protocol).map(|p| vec![p]))
        .unwrap_or_default();

    debug!(
        title = %title,
        raml_version = %version,
        base_path = %base_path,
        resources = resources.len(),
        "RAML document parsed"
    );

    Ok(Specification {
        version,
        title,
        api_version,
        base_path,
        protocols,
        media_type,
        resources,
    })
}

fn parse_header(content: &str) -> Result<RamlVersion, ParseError> {
    let first = content
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(ParseError::MissingHeader)?;
    match first.strip_prefix("#%RAML").map(str::trim) {
        Some("0.8") => Ok(RamlVersion::V08),
        Some("1.0") => Ok(RamlVersion::V10),
        _ => Err(ParseError::MissingHeader),
    }
}

fn resolve_includes(value: &mut Value, base_dir: &Path, depth: usize) -> Result<(), ParseError> {
    if let Value::Tagged(tagged) = value {
        if tagged.tag.to_string().trim_start_matches('!') == "include" {
            let resolved = load_include(&tagged.value, base_dir, depth)?;
            *value = resolved;
            return Ok(());
        }
        let inner = std::mem::take(&mut tagged.value);
        *value = inner;
    }
    match value {
        Value::Mapping(m) => {
            for v in m.values_mut() {
                resolve_includes(v, base_dir, depth)?;
            }
        }
        Value::Sequence(s) => {
            for v in s.iter_mut() {
                resolve_includes(v, base_dir, depth)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn load_include(target: &Value, base_dir: &Path, depth: usize) -> Result<Value, ParseError> {
    let rel = target
        .as_str()
        .ok_or_else(|| ParseError::invalid("!include", "include target must be a path"))?;
    let path = base_dir.join(rel.trim());
    if depth >= MAX_INCLUDE_DEPTH {
        return Err(ParseError::UnresolvableInclude {
            path,
            reason: "include nesting too deep".to_string(),
        });
    }
    let content =
        std::fs::read_to_string(&path).map_err(|e| ParseError::UnresolvableInclude {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    let structured = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("raml" | "yaml" | "yml" | "json")
    );
    if !structured {
        return Ok(Value::String(content));
    }

    let mut included: Value =
        serde_yaml::from_str(&content).map_err(|e| ParseError::UnresolvableInclude {
            path: path.clone(),
            reason: e.to_string(),
        })?;
    let next_base = path.parent().unwrap_or(base_dir).to_path_buf();
    resolve_includes(&mut included, &next_base, depth + 1)?;
    debug!(include = %path.display(), "Resolved !include");
    Ok(included)
}

fn parse_resource(
    relative_uri: &str,
    value: &Value,
    ctx: &Ctx,
    parent: &str,
) -> Result<Resource, ParseError> {
    let location = format!("{parent}{relative_uri}");
    if relative_uri.len() < 2 && relative_uri != "/" {
        return Err(ParseError::invalid(&location, "empty resource path"));
    }

    let mut resource = Resource {
        relative_uri: relative_uri.to_string(),
        display_name: None,
        uri_parameters: Vec::new(),
        methods: Vec::new(),
        children: Vec::new(),
    };

    let map = match value {
        Value::Null => return Ok(resource),
        Value::Mapping(m) => m,
        _ => return Err(ParseError::invalid(&location, "resource must be a mapping")),
    };

    for (k, v) in map {
        let key = key_str(k, &location)?;
        if key.starts_with('/') {
            resource
                .children
                .push(parse_resource(key, v, ctx, &location)?);
            continue;
        }
        if let Some(method) = parse_verb(key) {
            resource
                .methods
                .push(parse_method(method, v, ctx, &location)?);
            continue;
        }
        if is_annotation(key) {
            continue;
        }
        match key {
            "uriParameters" => {
                resource.uri_parameters =
                    parse_parameters(v, ParameterLocation::Path, ctx, &location)?;
            }
            "displayName" => resource.display_name = Some(scalar_string(v, &location)?),
            k if RESOURCE_KEYS.contains(&k) => {}
            _ => {
                return Err(ParseError::UnknownDirective {
                    location,
                    key: key.to_string(),
                })
            }
        }
    }

    Ok(resource)
}

fn parse_verb(key: &str) -> Option<Method> {
    match key {
        "get" => Some(Method::GET),
        "head" => Some(Method::HEAD),
        "post" => Some(Method::POST),
        "put" => Some(Method::PUT),
        "patch" => Some(Method::PATCH),
        "delete" => Some(Method::DELETE),
        "options" => Some(Method::OPTIONS),
        "trace" => Some(Method::TRACE),
        _ => None,
    }
}

fn parse_method(
    method: Method,
    value: &Value,
    ctx: &Ctx,
    resource: &str,
) -> Result<MethodSpec, ParseError> {
    let location = format!("{resource} {method}");
    let mut spec = MethodSpec {
        method,
        handler: None,
        description: None,
        query_parameters: Vec::new(),
        headers: Vec::new(),
        body: None,
    };

    let map = match value {
        Value::Null => return Ok(spec),
        Value::Mapping(m) => m,
        _ => return Err(ParseError::invalid(&location, "method must be a mapping")),
    };

    let mut annotated = None;
    let mut display_name = None;
    for (k, v) in map {
        let key = key_str(k, &location)?;
        match key {
            HANDLER_ANNOTATION => annotated = Some(scalar_string(v, &location)?),
            "displayName" => display_name = Some(scalar_string(v, &location)?),
            "description" => spec.description = Some(scalar_string(v, &location)?),
            "queryParameters" => {
                spec.query_parameters =
                    parse_parameters(v, ParameterLocation::Query, ctx, &location)?;
            }
            "headers" => {
                spec.headers = parse_parameters(v, ParameterLocation::Header, ctx, &location)?;
            }
            "body" => spec.body = Some(parse_body(v, ctx)),
            k if METHOD_KEYS.contains(&k) || is_annotation(k) => {}
            _ => {
                return Err(ParseError::UnknownDirective {
                    location,
                    key: key.to_string(),
                })
            }
        }
    }

    spec.handler = annotated
        .filter(|h| !h.is_empty())
        .or_else(|| display_name.map(|d| super::slugify(&d)).filter(|h| !h.is_empty()));
    Ok(spec)
}

fn parse_body(value: &Value, ctx: &Ctx) -> BodySpec {
    let declared: Vec<String> = match value {
        Value::Mapping(m) => m
            .keys()
            .filter_map(Value::as_str)
            .filter(|k| k.contains('/'))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };
    if !declared.is_empty() {
        return BodySpec {
            media_types: declared,
        };
    }
    BodySpec {
        media_types: ctx.media_type.iter().cloned().collect(),
    }
}

fn parse_parameters(
    value: &Value,
    location: ParameterLocation,
    ctx: &Ctx,
    at: &str,
) -> Result<Vec<Parameter>, ParseError> {
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(m) => m,
        _ => return Err(ParseError::invalid(at, format!("{location} parameters must be a mapping"))),
    };

    let default_required = match (location, ctx.version) {
        (ParameterLocation::Path, _) => true,
        (_, RamlVersion::V08) => false,
        (_, RamlVersion::V10) => true,
    };

    let mut params = Vec::with_capacity(map.len());
    for (k, v) in map {
        let raw_name = key_str(k, at)?;
        let (name, optional_marker) = match raw_name.strip_suffix('?') {
            Some(n) if ctx.version == RamlVersion::V10 && location != ParameterLocation::Path => {
                (n, true)
            }
            _ => (raw_name, false),
        };
        let param_at = format!("{at} {location} parameter '{name}'");
        let mut param = Parameter::implicit_path(name);
        param.location = location;
        param.required = default_required && !optional_marker;

        // RAML 0.8 allows a list of alternative definitions; the first one wins.
        let def = match v {
            Value::Sequence(seq) => seq.first(),
            other => Some(other),
        };
        match def {
            None | Some(Value::Null) => {}
            Some(Value::String(ty)) => param.param_type = ParamType::parse(ty),
            Some(Value::Mapping(facets)) => apply_facets(&mut param, facets, &param_at)?,
            Some(_) => {
                return Err(ParseError::invalid(param_at, "expected facets or a type name"))
            }
        }
        params.push(param);
    }
    Ok(params)
}

fn apply_facets(param: &mut Parameter, facets: &Mapping, at: &str) -> Result<(), ParseError> {
    for (k, v) in facets {
        let key = key_str(k, at)?;
        match key {
            "type" => param.param_type = ParamType::parse(&scalar_string(v, at)?),
            "required" => {
                param.required = v
                    .as_bool()
                    .ok_or_else(|| ParseError::invalid(at, "'required' must be a boolean"))?;
            }
            "pattern" => param.pattern = Some(scalar_string(v, at)?),
            "enum" => {
                let values = v
                    .as_sequence()
                    .ok_or_else(|| ParseError::invalid(at, "'enum' must be a list"))?;
                param.enum_values = values
                    .iter()
                    .map(|e| scalar_string(e, at))
                    .collect::<Result<_, _>>()?;
            }
            "minimum" => param.minimum = Some(number(v, at)?),
            "maximum" => param.maximum = Some(number(v, at)?),
            "minLength" => param.min_length = Some(length(v, at)?),
            "maxLength" => param.max_length = Some(length(v, at)?),
            "default" => {
                param.default = Some(
                    serde_json::to_value(v)
                        .map_err(|e| ParseError::invalid(at, e.to_string()))?,
                );
            }
            // descriptive facets
            _ => {}
        }
    }
    Ok(())
}

fn parse_protocols(value: &Value) -> Result<Vec<Protocol>, ParseError> {
    let items: Vec<&Value> = match value {
        Value::Sequence(seq) => seq.iter().collect(),
        other => vec![other],
    };
    items
        .into_iter()
        .map(|item| {
            let s = scalar_string(item, "protocols")?;
            match s.to_ascii_uppercase().as_str() {
                "HTTP" => Ok(Protocol::Http),
                "HTTPS" => Ok(Protocol::Https),
                _ => Err(ParseError::UnsupportedProtocol(s)),
            }
        })
        .collect()
}

fn base_path_of(base_uri: &str) -> String {
    let path = match base_uri.find("://") {
        Some(i) => {
            let rest = &base_uri[i + 3..];
            rest.find('/').map(|p| &rest[p..]).unwrap_or("")
        }
        None => base_uri,
    };
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn scheme_protocol(base_uri: &str) -> Option<Protocol> {
    let scheme = &base_uri[..base_uri.find("://")?];
    match scheme.to_ascii_lowercase().as_str() {
        "http" => Some(Protocol::Http),
        "https" => Some(Protocol::Https),
        _ => None,
    }
}

fn is_annotation(key: &str) -> bool {
    key.len() > 2 && key.starts_with('(') && key.ends_with(')')
}

fn key_str<'a>(key: &'a Value, at: &str) -> Result<&'a str, ParseError> {
    key.as_str()
        .ok_or_else(|| ParseError::invalid(at, format!("expected a string key, found {key:?}")))
}

fn scalar_string(value: &Value, at: &str) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ParseError::invalid(at, "expected a scalar value")),
    }
}

fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Sequence(seq) => seq.first().and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn number(value: &Value, at: &str) -> Result<f64, ParseError> {
    value
        .as_f64()
        .ok_or_else(|| ParseError::invalid(at, "expected a number"))
}

fn length(value: &Value, at: &str) -> Result<usize, ParseError> {
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| ParseError::invalid(at, "expected a non-negative integer"))
}

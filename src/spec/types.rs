use http::Method;
use serde_json::Value;
use std::fmt;

/// RAML language version declared in the document header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamlVersion {
    V08,
    V10,
}

impl fmt::Display for RamlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RamlVersion::V08 => write!(f, "0.8"),
            RamlVersion::V10 => write!(f, "1.0"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Https => write!(f, "HTTPS"),
        }
    }
}

/// Parsed RAML document. Immutable after loading.
#[derive(Debug, Clone)]
pub struct Specification {
    pub version: RamlVersion,
    pub title: String,
    pub api_version: Option<String>,
    /// Path component of `baseUri` (empty when absent or `/`)
    pub base_path: String,
    pub protocols: Vec<Protocol>,
    pub media_type: Option<String>,
    pub resources: Vec<Resource>,
}

impl Specification {
    /// Number of methods declared anywhere in the resource tree.
    #[must_use]
    pub fn method_count(&self) -> usize {
        fn count(resources: &[Resource]) -> usize {
            resources
                .iter()
                .map(|r| r.methods.len() + count(&r.children))
                .sum()
        }
        count(&self.resources)
    }
}

/// A resource node: relative URI such as `/products` or `/{productID}`.
#[derive(Debug, Clone)]
pub struct Resource {
    pub relative_uri: String,
    pub display_name: Option<String>,
    pub uri_parameters: Vec<Parameter>,
    pub methods: Vec<MethodSpec>,
    pub children: Vec<Resource>,
}

/// An HTTP verb bound to a resource.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub method: Method,
    /// Explicit handler binding from the `(handler)` annotation or `displayName`
    pub handler: Option<String>,
    pub description: Option<String>,
    pub query_parameters: Vec<Parameter>,
    pub headers: Vec<Parameter>,
    pub body: Option<BodySpec>,
}

/// Declared request body: the accepted media types (empty means "any").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodySpec {
    pub media_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "path"),
            ParameterLocation::Query => write!(f, "query"),
            ParameterLocation::Header => write!(f, "header"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Date,
    File,
    Any,
}

impl ParamType {
    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "integer" => ParamType::Integer,
            "number" => ParamType::Number,
            "boolean" => ParamType::Boolean,
            "date" | "date-only" | "datetime" | "datetime-only" | "time-only" => ParamType::Date,
            "file" => ParamType::File,
            "string" => ParamType::String,
            _ => ParamType::Any,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Date => "date",
            ParamType::File => "file",
            ParamType::Any => "any",
        };
        f.write_str(s)
    }
}

/// A declared parameter with its RAML facets.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub param_type: ParamType,
    pub required: bool,
    pub pattern: Option<String>,
    pub enum_values: Vec<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub default: Option<Value>,
}

impl Parameter {
    /// Implicit parameter for a templated segment with no declaration.
    pub(crate) fn implicit_path(name: &str) -> Self {
        Self {
            name: name.to_string(),
            location: ParameterLocation::Path,
            param_type: ParamType::String,
            required: true,
            pattern: None,
            enum_values: Vec::new(),
            minimum: None,
            maximum: None,
            min_length: None,
            max_length: None,
            default: None,
        }
    }
}

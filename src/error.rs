//! # Error Taxonomy
//!
//! Startup-time errors ([`LoadError`], [`ParseError`], [`CompileError`], [`BindError`]) are
//! fatal: they abort initialization and are surfaced to the operator through
//! [`RouterError`]. [`DispatchError`] is per-request and always turns into a well-formed
//! HTTP error response.

use crate::router::MethodSet;
use http::Method;
use serde_json::{json, Value};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// The RAML document could not be read.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("RAML file not found: {path}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("permission denied reading RAML file: {path}")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read RAML file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound { path, source },
            io::ErrorKind::PermissionDenied => LoadError::PermissionDenied { path, source },
            _ => LoadError::Io { path, source },
        }
    }
}

/// The RAML document does not conform to the grammar this router understands.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document does not start with a '#%RAML 0.8' or '#%RAML 1.0' header")]
    MissingHeader,
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("document root must be a mapping with a 'title'")]
    MissingTitle,
    #[error("unknown directive '{key}' at {location}")]
    UnknownDirective { location: String, key: String },
    #[error("invalid value at {location}: {message}")]
    InvalidValue { location: String, message: String },
    #[error("unresolvable include '{path}': {reason}")]
    UnresolvableInclude { path: PathBuf, reason: String },
    #[error("unsupported protocol '{0}' (expected HTTP or HTTPS)")]
    UnsupportedProtocol(String),
}

impl ParseError {
    pub(crate) fn invalid(location: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::InvalidValue {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// The specification cannot be compiled into an unambiguous route table.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },
    #[error("ambiguous templates at {location}: '{{{existing}}}' and '{{{conflicting}}}'")]
    AmbiguousTemplate {
        location: String,
        existing: String,
        conflicting: String,
    },
    #[error("parameter '{{{name}}}' appears more than once in {pattern}")]
    DuplicateParameter { pattern: String, name: String },
    #[error("handler name '{handler}' derived for {pattern} is already bound to {existing}")]
    HandlerNameCollision {
        handler: String,
        pattern: String,
        existing: String,
    },
    #[error("segment '{segment}' in {pattern} mixes literal text with a template")]
    InvalidSegment { pattern: String, segment: String },
    #[error("parameter '{parameter}' has an invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        parameter: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// The listener could not be started.
#[derive(Debug, Error)]
#[error("could not bind {addr}: {kind}")]
pub struct BindError {
    pub addr: SocketAddr,
    pub kind: BindErrorKind,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindErrorKind {
    #[error("address already in use")]
    AddrInUse,
    #[error("permission denied")]
    PermissionDenied,
    #[error("I/O error")]
    Io,
}

impl BindError {
    pub(crate) fn new(addr: SocketAddr, source: io::Error) -> Self {
        let kind = match source.kind() {
            io::ErrorKind::AddrInUse => BindErrorKind::AddrInUse,
            io::ErrorKind::PermissionDenied => BindErrorKind::PermissionDenied,
            _ => BindErrorKind::Io,
        };
        Self { addr, kind, source }
    }
}

/// Per-request failures. Each variant maps onto a response status and a JSON body that
/// never includes internal failure detail.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route for {method} {path}")]
    NotFound { method: Method, path: String },
    #[error("{method} not allowed for {path} (allowed: {allowed})")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: MethodSet,
    },
    #[error("invalid parameters: {}", details.join("; "))]
    InvalidParameters { details: Vec<String> },
    #[error("malformed request body: {reason}")]
    MalformedBody { reason: String },
    #[error("request body of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("no handler registered under '{handler}'")]
    HandlerNotRegistered { handler: String },
    #[error("handler '{handler}' failed: {reason}")]
    HandlerFailed { handler: String, reason: String },
}

impl DispatchError {
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::MethodNotAllowed { .. } => 405,
            DispatchError::InvalidParameters { .. } | DispatchError::MalformedBody { .. } => 400,
            DispatchError::PayloadTooLarge { .. } => 413,
            DispatchError::HandlerNotRegistered { .. } | DispatchError::HandlerFailed { .. } => {
                500
            }
        }
    }

    /// Client-facing JSON body for this failure.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            DispatchError::NotFound { method, path } => {
                json!({ "error": "Not Found", "method": method.as_str(), "path": path })
            }
            DispatchError::MethodNotAllowed {
                method,
                path,
                allowed,
            } => json!({
                "error": "Method Not Allowed",
                "method": method.as_str(),
                "path": path,
                "allowed": allowed.names(),
            }),
            DispatchError::InvalidParameters { details } => {
                json!({ "error": "Invalid Parameters", "details": details })
            }
            DispatchError::MalformedBody { .. } => json!({ "error": "Malformed Request Body" }),
            DispatchError::PayloadTooLarge { limit, .. } => {
                json!({ "error": "Payload Too Large", "limit": limit })
            }
            DispatchError::HandlerNotRegistered { .. } | DispatchError::HandlerFailed { .. } => {
                json!({ "error": "Internal Server Error" })
            }
        }
    }
}

/// Any startup-time failure. Never retried.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Bind(#[from] BindError),
}

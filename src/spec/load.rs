use super::parse::parse_raml;
use super::types::Specification;
use crate::config::RouterConfig;
use crate::error::{LoadError, RouterError};
use std::path::Path;
use tracing::info;

/// Load the Specification named by `config`: inline `ramlString` when non-empty,
/// otherwise the file at `ramlFile`.
pub fn load(config: &RouterConfig) -> Result<Specification, RouterError> {
    match config.inline_raml() {
        Some(text) => {
            info!(source = "ramlString", "Loading RAML specification");
            Ok(load_str(text)?)
        }
        None => load_file(&config.raml_file),
    }
}

/// Parse inline RAML text. Relative includes resolve against the working directory.
pub fn load_str(text: &str) -> Result<Specification, crate::error::ParseError> {
    parse_raml(text, Path::new("."))
}

/// Read and parse a RAML file. Relative includes resolve against the file's directory.
pub fn load_file(path: impl AsRef<Path>) -> Result<Specification, RouterError> {
    let path = path.as_ref();
    info!(source = %path.display(), "Loading RAML specification");
    let content =
        std::fs::read_to_string(path).map_err(|e| LoadError::from_io(path, e))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let spec = parse_raml(&content, base_dir)?;
    info!(
        title = %spec.title,
        resources = spec.resources.len(),
        methods = spec.method_count(),
        "RAML specification loaded"
    );
    Ok(spec)
}

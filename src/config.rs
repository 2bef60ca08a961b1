//! # Router Configuration
//!
//! [`RouterConfig`] carries the options a deployment supplies at process start:
//!
//! | Key | Type | Default |
//! |---|---|---|
//! | `ramlString` | inline RAML text | none |
//! | `ramlFile` | path to a RAML file | `conf/default.raml` |
//! | `port` | listener port | `8888` |
//! | `bodyLimit` | max request body in bytes | unlimited |
//!
//! Values come from a JSON or YAML file ([`RouterConfig::from_file`]), then environment
//! overrides ([`RouterConfig::apply_env`]), then CLI flags. The resulting value is passed
//! explicitly into the loader, compiler and server; there is no process-wide config.
//!
//! ## Environment Variables
//!
//! - `RAMLR_RAML_FILE` overrides `ramlFile`
//! - `RAMLR_PORT` overrides `port`
//! - `RAMLR_BODY_LIMIT` overrides `bodyLimit`

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_RAML_FILE: &str = "conf/default.raml";
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterConfig {
    /// Inline RAML text; wins over `raml_file` when non-empty
    pub raml_string: Option<String>,
    pub raml_file: PathBuf,
    pub port: u16,
    pub body_limit: Option<usize>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            raml_string: None,
            raml_file: PathBuf::from(DEFAULT_RAML_FILE),
            port: DEFAULT_PORT,
            body_limit: None,
        }
    }
}

impl RouterConfig {
    /// Read configuration from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        let config = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("invalid YAML config {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON config {}", path.display()))?
        };
        Ok(config)
    }

    /// Apply `RAMLR_*` environment overrides. Unparseable numbers are ignored with a warning.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Ok(file) = env::var("RAMLR_RAML_FILE") {
            if !file.is_empty() {
                self.raml_file = PathBuf::from(file);
            }
        }
        if let Ok(port) = env::var("RAMLR_PORT") {
            match port.parse() {
                Ok(p) => self.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid RAMLR_PORT"),
            }
        }
        if let Ok(limit) = env::var("RAMLR_BODY_LIMIT") {
            match limit.parse() {
                Ok(l) => self.body_limit = Some(l),
                Err(_) => warn!(value = %limit, "Ignoring invalid RAMLR_BODY_LIMIT"),
            }
        }
        self
    }

    /// Inline RAML text, if present and non-empty.
    #[must_use]
    pub fn inline_raml(&self) -> Option<&str> {
        self.raml_string.as_deref().filter(|s| !s.trim().is_empty())
    }
}

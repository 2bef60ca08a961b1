//! Startup sequence: load the specification, compile the route table, start the listener.
//!
//! Any failure is fatal and returned as [`RouterError`]; nothing is retried. A returned
//! [`Running`] is the success signal for whoever supervises the process.

use crate::config::RouterConfig;
use crate::dispatcher::Dispatcher;
use crate::error::RouterError;
use crate::router::RouteTable;
use crate::server::{self, ServerHandle};
use crate::spec::{self, Protocol};
use std::sync::Arc;
use tracing::{error, info, warn};

/// A started router.
pub struct Running {
    pub table: Arc<RouteTable>,
    pub server: ServerHandle,
}

/// Load and compile the specification named by `config`.
pub fn prepare(config: &RouterConfig) -> Result<Arc<RouteTable>, RouterError> {
    let result = spec::load(config).and_then(|spec| {
        info!(
            title = %spec.title,
            raml_version = %spec.version,
            protocols = ?spec.protocols,
            "Specification ready"
        );
        if !spec.protocols.is_empty() && !spec.protocols.contains(&Protocol::Http) {
            warn!(
                protocols = ?spec.protocols,
                "Specification does not declare HTTP; listener serves plain HTTP regardless"
            );
        }
        Ok(RouteTable::compile(&spec)?)
    });
    match result {
        Ok(table) => Ok(Arc::new(table)),
        Err(e) => {
            error!(error = %e, "Could not prepare routes");
            Err(e)
        }
    }
}

/// Load, compile and listen on `config.port`.
pub fn start(config: &RouterConfig, dispatcher: Arc<Dispatcher>) -> Result<Running, RouterError> {
    let table = prepare(config)?;
    start_with_table(config, table, dispatcher)
}

/// Listen with an already compiled table, e.g. after registering handlers against it.
pub fn start_with_table(
    config: &RouterConfig,
    table: Arc<RouteTable>,
    dispatcher: Arc<Dispatcher>,
) -> Result<Running, RouterError> {
    let missing: Vec<&str> = table
        .entries()
        .iter()
        .map(|e| e.handler_name.as_str())
        .filter(|name| !dispatcher.has_handler(name))
        .collect();
    if !missing.is_empty() {
        warn!(
            missing_handlers = ?missing,
            "Routes without a registered handler will answer 500"
        );
    }
    let server = server::start(Arc::clone(&table), dispatcher, config.port)?;
    Ok(Running { table, server })
}

//! # ramlrouter
//!
//! A coroutine-powered HTTP router for Rust, driven by a
//! [RAML 0.8 / 1.0](https://github.com/raml-org/raml-spec) document.
//!
//! ## Overview
//!
//! At startup the RAML document is loaded and parsed into a [`spec::Specification`], then
//! compiled into an immutable [`router::RouteTable`]. Each incoming request is matched
//! against that table, its declared parameters are bound and checked, and the request is
//! handed to a handler coroutine registered by name with the [`dispatcher::Dispatcher`].
//!
//! ## Architecture
//!
//! - **[`spec`]** - RAML loading, `!include` resolution and parsing
//! - **[`router`]** - Segment radix tree with literal-over-template precedence
//! - **[`dispatcher`]** - Parameter binding, body decoding and coroutine handler dispatch
//! - **[`server`]** - HTTP listener built on `may_minihttp`
//! - **[`middleware`]** - Request tracing and metrics hooks
//! - **[`bootstrap`]** - The load, compile, listen startup sequence
//! - **[`cli`]** - The `ramlrouter` binary
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as server::AppService
//!     participant Dispatcher
//!     participant Table as RouteTable
//!     participant Handler as Handler coroutine
//!
//!     Client->>Server: GET /products/42?verbose=true
//!     Server->>Dispatcher: dispatch(table, IncomingRequest)
//!     Dispatcher->>Table: lookup(GET, /products/42)
//!     Table-->>Dispatcher: Matched { get_product, {productId: 42} }
//!     Dispatcher->>Dispatcher: bind + validate params, decode body
//!     Dispatcher->>Handler: Job { RequestContext }
//!     Handler-->>Dispatcher: HandlerResponse
//!     Dispatcher-->>Server: Ok(HandlerResponse)
//!     Server-->>Client: 200 application/json
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ramlrouter::{bootstrap, Dispatcher, HandlerResponse, RouterConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let config = RouterConfig::default();
//! let table = bootstrap::prepare(&config)?;
//!
//! let mut dispatcher = Dispatcher::new();
//! unsafe {
//!     dispatcher.register_handler("get_product", |ctx| {
//!         Ok(HandlerResponse::ok(json!({ "id": ctx.path_param("productId") })))
//!     })?;
//! }
//!
//! let running = bootstrap::start_with_table(&config, table, Arc::new(dispatcher))?;
//! running.server.join().ok();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Errors
//!
//! Startup failures are returned as [`error::RouterError`] and are fatal. Per-request
//! failures are [`error::DispatchError`] values, each mapping to one HTTP status.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod spec;

pub use config::RouterConfig;
pub use dispatcher::{Dispatcher, HandlerResponse, IncomingRequest, RequestContext};
pub use error::{DispatchError, RouterError};
pub use router::{MethodSet, RouteLookup, RouteTable};
pub use spec::{load, load_file, load_str, Specification};

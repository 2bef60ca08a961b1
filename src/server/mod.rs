//! # Server Module
//!
//! HTTP listener on top of `may_minihttp`. Each connection is served by a coroutine; every
//! request is parsed into an [`IncomingRequest`](crate::dispatcher::IncomingRequest),
//! handed to the [`Dispatcher`](crate::dispatcher::Dispatcher) and written back.
//!
//! ## Responses
//!
//! - handler bodies: `text/plain` for string values, `application/json` otherwise
//! - dispatch failures: JSON `{"error": ...}` with the mapped status
//! - 405 responses carry `Allow: GET, PUT` in canonical verb order
//!
//! ## Startup
//!
//! [`start`] binds `0.0.0.0:port` and returns a [`ServerHandle`] on success or a
//! [`BindError`](crate::error::BindError) when the port is taken or not permitted.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{start, start_on, ServerHandle};
pub use request::parse_request;
pub use response::{write_dispatch_error, write_handler_response};
pub use service::AppService;

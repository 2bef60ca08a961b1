//! # Dispatcher Module
//!
//! Turns an [`IncomingRequest`] into a handler invocation: route lookup, parameter binding
//! and validation, body decoding, middleware, and the handler call itself.
//!
//! ## Architecture
//!
//! Handlers run on the `may` coroutine runtime:
//!
//! - each registered handler owns one coroutine fed by an MPSC channel
//! - every request carries its own reply channel
//! - panics and `Err` returns are caught in the coroutine and reported as failures
//! - stack size comes from `RAMLR_STACK_SIZE`
//!
//! ## Handler Registration
//!
//! ```rust,ignore
//! use ramlrouter::dispatcher::{Dispatcher, HandlerResponse};
//! use serde_json::json;
//!
//! let mut dispatcher = Dispatcher::new();
//! unsafe {
//!     dispatcher.register_handler("get_product", |ctx| {
//!         Ok(HandlerResponse::ok(json!({ "id": ctx.param("productID") })))
//!     })?;
//! }
//! ```
//!
//! ## Request Flow
//!
//! 1. normalize the path and look it up in the [`RouteTable`](crate::router::RouteTable)
//! 2. parse the query string, apply declared defaults, validate declared parameters
//! 3. enforce the body limit and decode the body by media type
//! 4. run middleware `before`, send the [`RequestContext`] to the handler, wait for the reply
//! 5. run middleware `after` and return the [`HandlerResponse`]
//!
//! ## Error Handling
//!
//! | Failure | Status |
//! |---|---|
//! | no route | 404 |
//! | route exists for other verbs | 405 |
//! | invalid parameters or malformed body | 400 |
//! | body over the limit | 413 |
//! | handler missing, failed, panicked or went away | 500 |
//!
//! Failures reach middleware through `on_error` and are returned as
//! [`DispatchError`](crate::error::DispatchError); the client never sees internal detail.

mod body;
mod core;
mod validate;

pub use core::{
    Dispatcher, HandlerResponse, IncomingRequest, RequestContext, REQUEST_ID_HEADER,
};

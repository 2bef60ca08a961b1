use super::body::decode_body;
use super::validate::{apply_defaults, validate_params};
use crate::error::DispatchError;
use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::{normalize_path, RouteLookup, RouteTable};
use crate::runtime_config::RuntimeConfig;
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde_json::{json, Value};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Header used to correlate a request across services.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A request as received by the server, before routing.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    /// Raw request target, query string included
    pub target: String,
    /// Header names are lower-cased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl IncomingRequest {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.headers
            .insert("content-type".to_string(), content_type.to_string());
        self.body = body.into();
        self
    }
}

/// Everything a handler gets to see about one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: Method,
    /// Normalized request path
    pub path: String,
    /// Matched route pattern, e.g. `/products/{productID}`
    pub pattern: String,
    pub handler_name: String,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    /// Decoded body; `None` when the request carried no body
    pub body: Option<Value>,
    pub raw_body: Vec<u8>,
}

impl RequestContext {
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Path parameter, falling back to the query parameter of the same name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_param(name).or_else(|| self.query_param(name))
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Handler output. A `Value::String` body is sent as `text/plain`, anything else as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, Value::String(body.into()))
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::new(status, json!({ "error": message }))
    }
}

impl From<&DispatchError> for HandlerResponse {
    fn from(err: &DispatchError) -> Self {
        Self::new(err.status(), err.body())
    }
}

type Reply = Result<HandlerResponse, String>;

pub(crate) struct Job {
    ctx: RequestContext,
    reply_tx: mpsc::Sender<Reply>,
}

/// Routes matched requests to handler coroutines registered by name.
pub struct Dispatcher {
    handlers: HashMap<String, mpsc::Sender<Job>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    body_limit: Option<usize>,
    stack_size: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Empty dispatcher. Handler coroutines use the stack size from [`RuntimeConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            middlewares: Vec::new(),
            body_limit: None,
            stack_size: RuntimeConfig::from_env().stack_size,
        }
    }

    /// Reject request bodies larger than `limit` bytes with 413.
    #[must_use]
    pub fn with_body_limit(mut self, limit: Option<usize>) -> Self {
        self.body_limit = limit;
        self
    }

    #[must_use]
    pub fn body_limit(&self) -> Option<usize> {
        self.body_limit
    }

    #[must_use]
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Middleware runs in insertion order.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Register `handler_fn` under `name`, served by a dedicated coroutine.
    ///
    /// Re-registering a name replaces the previous handler; its coroutine exits once the old
    /// channel closes. An `Err` return or a panic inside the handler is reported back as a
    /// failure and never takes the coroutine down.
    ///
    /// # Safety
    ///
    /// Spawns with `may::coroutine::Builder::spawn`, which is unsafe in `may`. The caller
    /// must have configured the `may` runtime and the handler must not block the worker
    /// thread on thread-local state.
    ///
    /// # Errors
    ///
    /// Returns the spawn error when the coroutine cannot be created.
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F) -> std::io::Result<()>
    where
        F: Fn(RequestContext) -> anyhow::Result<HandlerResponse> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Job>();
        let handler_name = name.to_string();
        let stack_size = self.stack_size;

        // SAFETY: the closure owns everything it touches and is Send + 'static.
        let spawned = unsafe {
            coroutine::Builder::new()
                .name(format!("handler-{handler_name}"))
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(handler_name = %handler_name, stack_size, "Handler coroutine start");
                    for Job { ctx, reply_tx } in rx.iter() {
                        let request_id = ctx.request_id;
                        let started = Instant::now();
                        let outcome = match std::panic::catch_unwind(
                            std::panic::AssertUnwindSafe(|| handler_fn(ctx)),
                        ) {
                            Ok(Ok(resp)) => Ok(resp),
                            Ok(Err(e)) => Err(format!("{e:#}")),
                            Err(panic) => Err(format!("panicked: {}", panic_message(&*panic))),
                        };
                        debug!(
                            request_id = %request_id,
                            handler_name = %handler_name,
                            execution_time_us = started.elapsed().as_micros() as u64,
                            ok = outcome.is_ok(),
                            "Handler execution complete"
                        );
                        if reply_tx.send(outcome).is_err() {
                            warn!(
                                request_id = %request_id,
                                handler_name = %handler_name,
                                "Reply receiver dropped before handler finished"
                            );
                        }
                    }
                    debug!(handler_name = %handler_name, "Handler coroutine exit");
                })
        };

        if let Err(e) = spawned {
            error!(
                handler_name = %name,
                error = %e,
                stack_size,
                "Failed to spawn handler coroutine"
            );
            return Err(e);
        }

        if self.handlers.insert(name.to_string(), tx).is_some() {
            warn!(handler_name = %name, "Replaced existing handler");
        }
        info!(
            handler_name = %name,
            total_handlers = self.handlers.len(),
            "Handler registered"
        );
        Ok(())
    }

    /// Match `request` against `table`, bind parameters, decode the body and run the handler.
    ///
    /// Every failure is returned as a [`DispatchError`] carrying its status code; the
    /// dispatcher itself never panics on bad input or failing handlers.
    pub fn dispatch(
        &self,
        table: &RouteTable,
        request: IncomingRequest,
    ) -> Result<HandlerResponse, DispatchError> {
        let request_id =
            RequestId::from_header_or_new(request.headers.get(REQUEST_ID_HEADER).map(String::as_str));
        let result = self.dispatch_inner(table, request, request_id);
        if let Err(err) = &result {
            for mw in &self.middlewares {
                mw.on_error(&request_id, err);
            }
        }
        result
    }

    /// Report a request that failed before it could be dispatched, e.g. an unreadable body.
    ///
    /// The error goes through the same `on_error` chain as [`Dispatcher::dispatch`] failures
    /// and is handed back for the response writer.
    pub fn reject(&self, err: DispatchError) -> DispatchError {
        let request_id = RequestId::new();
        warn!(
            request_id = %request_id,
            status = err.status(),
            error = %err,
            "Request could not be parsed"
        );
        for mw in &self.middlewares {
            mw.on_error(&request_id, &err);
        }
        err
    }

    fn dispatch_inner(
        &self,
        table: &RouteTable,
        request: IncomingRequest,
        request_id: RequestId,
    ) -> Result<HandlerResponse, DispatchError> {
        let IncomingRequest {
            method,
            target,
            headers,
            body: raw_body,
        } = request;
        let (raw_path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (target.as_str(), None),
        };
        let path = normalize_path(raw_path);

        let route_match = match table.lookup(&method, &path) {
            RouteLookup::Matched(m) => m,
            RouteLookup::MethodNotAllowed(allowed) => {
                return Err(DispatchError::MethodNotAllowed {
                    method,
                    path,
                    allowed,
                })
            }
            RouteLookup::NotFound => return Err(DispatchError::NotFound { method, path }),
        };
        let route = Arc::clone(&route_match.route);

        let mut query_params = parse_query(query);
        apply_defaults(&route.query_params, &mut query_params);
        validate_params(&route, &route_match.path_params, &query_params, &headers)?;

        let body = decode_body(
            &raw_body,
            headers.get("content-type").map(String::as_str),
            route.body.as_ref(),
            self.body_limit,
        )?;

        let ctx = RequestContext {
            request_id,
            method,
            path,
            pattern: route.pattern.clone(),
            handler_name: route.handler_name.clone(),
            path_params: route_match.path_params,
            query_params,
            headers,
            body,
            raw_body,
        };

        let tx = self.handlers.get(&ctx.handler_name).ok_or_else(|| {
            let available: Vec<&String> = self.handlers.keys().collect();
            error!(
                request_id = %request_id,
                handler_name = %ctx.handler_name,
                available_handlers = ?available,
                "Handler not registered"
            );
            DispatchError::HandlerNotRegistered {
                handler: ctx.handler_name.clone(),
            }
        })?;

        let mut early = None;
        for mw in &self.middlewares {
            if early.is_none() {
                early = mw.before(&ctx);
            }
        }
        let (mut resp, latency) = match early {
            Some(r) => (r, Duration::ZERO),
            None => self.invoke(tx, &ctx)?,
        };

        for mw in &self.middlewares {
            mw.after(&ctx, &mut resp, latency);
        }
        Ok(resp)
    }

    fn invoke(
        &self,
        tx: &mpsc::Sender<Job>,
        ctx: &RequestContext,
    ) -> Result<(HandlerResponse, Duration), DispatchError> {
        let failed = |reason: String| {
            error!(
                request_id = %ctx.request_id,
                handler_name = %ctx.handler_name,
                reason = %reason,
                "Handler failed"
            );
            DispatchError::HandlerFailed {
                handler: ctx.handler_name.clone(),
                reason,
            }
        };

        info!(
            request_id = %ctx.request_id,
            handler_name = %ctx.handler_name,
            method = %ctx.method,
            path = %ctx.path,
            "Request dispatched to handler"
        );
        let start = Instant::now();
        let (reply_tx, reply_rx) = mpsc::channel();
        tx.send(Job {
            ctx: ctx.clone(),
            reply_tx,
        })
        .map_err(|_| failed("handler coroutine is gone".to_string()))?;

        match reply_rx.recv() {
            Ok(Ok(resp)) => {
                let latency = start.elapsed();
                info!(
                    request_id = %ctx.request_id,
                    handler_name = %ctx.handler_name,
                    status = resp.status,
                    latency_us = latency.as_micros() as u64,
                    "Handler response received"
                );
                Ok((resp, latency))
            }
            Ok(Err(reason)) => Err(failed(reason)),
            Err(_) => Err(failed("reply channel closed without a response".to_string())),
        }
    }
}

fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

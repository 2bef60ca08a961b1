use std::time::Duration;

use tracing::{error, info, warn};

use super::Middleware;
use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::DispatchError;
use crate::ids::RequestId;

/// Structured request log: one event per completed request, one per failure.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn after(&self, ctx: &RequestContext, res: &mut HandlerResponse, latency: Duration) {
        info!(
            request_id = %ctx.request_id,
            method = %ctx.method,
            path = %ctx.path,
            route_pattern = %ctx.pattern,
            handler_name = %ctx.handler_name,
            status = res.status,
            latency_us = latency.as_micros() as u64,
            "Request completed"
        );
    }

    fn on_error(&self, request_id: &RequestId, err: &DispatchError) {
        let status = err.status();
        if status >= 500 {
            error!(request_id = %request_id, status, error = %err, "Request failed");
        } else {
            warn!(request_id = %request_id, status, error = %err, "Request rejected");
        }
    }
}

use std::time::Duration;

use crate::dispatcher::{HandlerResponse, RequestContext};
use crate::error::DispatchError;
use crate::ids::RequestId;

/// Hooks around every dispatch. All methods default to no-ops.
pub trait Middleware: Send + Sync {
    /// Runs before the handler. Returning a response short-circuits the handler.
    fn before(&self, _ctx: &RequestContext) -> Option<HandlerResponse> {
        None
    }

    fn after(&self, _ctx: &RequestContext, _res: &mut HandlerResponse, _latency: Duration) {}

    /// Runs when dispatch fails (404, 405, 400, 413, 500).
    fn on_error(&self, _request_id: &RequestId, _err: &DispatchError) {}
}

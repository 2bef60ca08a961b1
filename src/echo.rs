use crate::dispatcher::{Dispatcher, HandlerResponse, RequestContext};
use crate::router::RouteTable;
use serde_json::json;

/// Reflects the bound request back as JSON. Used by `ramlrouter serve` for every route.
pub fn echo_handler(ctx: RequestContext) -> anyhow::Result<HandlerResponse> {
    Ok(HandlerResponse::ok(json!({
        "request_id": ctx.request_id.to_string(),
        "handler": ctx.handler_name,
        "method": ctx.method.as_str(),
        "path": ctx.path,
        "pattern": ctx.pattern,
        "path_params": ctx.path_params,
        "query_params": ctx.query_params,
        "body": ctx.body,
    })))
}

/// Register [`echo_handler`] under every handler name in `table` that has no handler yet.
///
/// # Safety
///
/// Same contract as [`Dispatcher::register_handler`].
pub unsafe fn register_echo_handlers(
    dispatcher: &mut Dispatcher,
    table: &RouteTable,
) -> std::io::Result<usize> {
    let mut registered = 0;
    for entry in table.entries() {
        if dispatcher.has_handler(&entry.handler_name) {
            continue;
        }
        // SAFETY: forwarded from the caller.
        unsafe { dispatcher.register_handler(&entry.handler_name, echo_handler)? };
        registered += 1;
    }
    Ok(registered)
}

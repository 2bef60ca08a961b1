use crate::dispatcher::HandlerResponse;
use crate::error::DispatchError;
use crate::router::MethodSet;
use may_minihttp::Response;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::error;

/// `Allow` header lines keyed by verb bitmask. At most 256 distinct sets exist, so the
/// leaked strings are bounded.
static ALLOW_HEADERS: Lazy<Mutex<HashMap<u8, &'static str>>> = Lazy::new(Default::default);

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        s if s < 200 => "Informational",
        s if s < 300 => "Success",
        s if s < 400 => "Redirection",
        s if s < 500 => "Client Error",
        _ => "Server Error",
    }
}

pub(crate) fn allow_header(allowed: MethodSet) -> &'static str {
    let mut cache = match ALLOW_HEADERS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    cache
        .entry(allowed.bits())
        .or_insert_with(|| Box::leak(format!("Allow: {allowed}").into_boxed_str()))
}

pub fn write_handler_response(res: &mut Response, resp: HandlerResponse) {
    res.status_code(usize::from(resp.status), status_reason(resp.status));
    match resp.body {
        Value::String(s) => {
            res.header("Content-Type: text/plain; charset=utf-8");
            res.body_vec(s.into_bytes());
        }
        other => {
            res.header("Content-Type: application/json");
            match serde_json::to_vec(&other) {
                Ok(bytes) => res.body_vec(bytes),
                Err(e) => {
                    error!(error = %e, "Failed to serialize response body");
                    res.status_code(500, status_reason(500));
                    res.body_vec(br#"{"error":"Internal Server Error"}"#.to_vec());
                }
            }
        }
    }
}

/// Write the status and JSON body for a failed dispatch; 405 also gets an `Allow` header.
pub fn write_dispatch_error(res: &mut Response, err: &DispatchError) {
    let status = err.status();
    res.status_code(usize::from(status), status_reason(status));
    if let DispatchError::MethodNotAllowed { allowed, .. } = err {
        res.header(allow_header(*allowed));
    }
    res.header("Content-Type: application/json");
    res.body_vec(err.body().to_string().into_bytes());
}

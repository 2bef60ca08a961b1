use crate::dispatcher::IncomingRequest;
use crate::error::DispatchError;
use http::Method;
use may_minihttp::Request;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Convert a `may_minihttp` request into an [`IncomingRequest`].
///
/// The body is read fully before dispatch. With a `body_limit`, at most `limit + 1` bytes
/// are read so oversized uploads are detected without buffering them whole.
pub fn parse_request(req: Request, body_limit: Option<usize>) -> Result<IncomingRequest, DispatchError> {
    let method = Method::from_bytes(req.method().as_bytes()).map_err(|_| {
        DispatchError::InvalidParameters {
            details: vec![format!("invalid request method '{}'", req.method())],
        }
    })?;
    let target = req.path().to_string();
    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();

    let mut body = Vec::new();
    let reader = req.body();
    let read = match body_limit {
        Some(limit) => reader
            .take(u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1))
            .read_to_end(&mut body),
        None => {
            let mut reader = reader;
            reader.read_to_end(&mut body)
        }
    };
    read.map_err(|e| DispatchError::MalformedBody {
        reason: format!("failed to read request body: {e}"),
    })?;

    debug!(
        method = %method,
        target = %target,
        headers_count = headers.len(),
        body_size_bytes = body.len(),
        "HTTP request parsed"
    );

    Ok(IncomingRequest {
        method,
        target,
        headers,
        body,
    })
}

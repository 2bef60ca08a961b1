//! Request body handling: size limit, then decoding by media type.

use crate::error::DispatchError;
use crate::spec::BodySpec;
use serde_json::{Map, Value};

/// Decode `raw` into a [`Value`]. An empty body yields `None`.
///
/// The media type comes from `Content-Type`, falling back to the first type the route
/// declares. JSON types (`application/json`, `*+json`) parse to structured values,
/// `application/x-www-form-urlencoded` to an object of strings, anything else to a string.
pub(crate) fn decode_body(
    raw: &[u8],
    content_type: Option<&str>,
    declared: Option<&BodySpec>,
    limit: Option<usize>,
) -> Result<Option<Value>, DispatchError> {
    if let Some(limit) = limit {
        if raw.len() > limit {
            return Err(DispatchError::PayloadTooLarge {
                size: raw.len(),
                limit,
            });
        }
    }
    if raw.is_empty() {
        return Ok(None);
    }

    let media_type = content_type
        .or_else(|| declared.and_then(|b| b.media_types.first().map(String::as_str)))
        .map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();

    if media_type == "application/json" || media_type.ends_with("+json") {
        return serde_json::from_slice(raw)
            .map(Some)
            .map_err(|e| DispatchError::MalformedBody {
                reason: e.to_string(),
            });
    }
    if media_type == "application/x-www-form-urlencoded" {
        let fields: Map<String, Value> = url::form_urlencoded::parse(raw)
            .into_owned()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        return Ok(Some(Value::Object(fields)));
    }
    Ok(Some(Value::String(String::from_utf8_lossy(raw).into_owned())))
}

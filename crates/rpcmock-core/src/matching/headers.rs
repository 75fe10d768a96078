//! Header conversions between intercepted exchanges and router requests.

use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use std::collections::HashMap;
use tracing::warn;

fn normalize_headers(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect()
}

/// Whether the `content-type` header names `application/json`.
///
/// Parameters such as `charset` are ignored.
pub fn is_json_content_type(headers: &HashMap<String, String>) -> bool {
    normalize_headers(headers)
        .get(CONTENT_TYPE.as_str())
        .and_then(|v| v.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Copy intercepted headers into a `HeaderMap`, skipping invalid entries.
pub fn to_header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let parsed = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        );
        match parsed {
            (Ok(name), Ok(value)) => {
                map.append(name, value);
            }
            _ => warn!(header = %name, "skipping header that is not valid HTTP"),
        }
    }
    map
}

/// Flatten a `HeaderMap`, joining repeated names with `", "`.
pub fn from_header_map(headers: Option<&HeaderMap>) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::new();
    let Some(headers) = headers else {
        return flat;
    };
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            warn!(header = %name, "skipping non-ASCII response header");
            continue;
        };
        flat.entry(name.as_str().to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_owned());
    }
    flat
}

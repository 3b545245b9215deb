// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::{ItunesError, Result};
use crate::models::ContentResponse;

/// Strip a `callback(...)` wrapper (optional trailing `;`) from a JSONP body.
pub fn unwrap_jsonp<'a>(body: &'a str, callback: &str) -> Result<&'a str> {
    let trimmed = body.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed);

    trimmed
        .strip_prefix(callback)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| ItunesError::Decode("unexpected JSONP response format".to_string()))
}

/// Decode a plain JSON `{"results": [...]}` body.
pub fn decode_content(body: &str) -> Result<ContentResponse> {
    Ok(serde_json::from_str(body)?)
}

/// Decode a search body, unwrapping JSONP when the request carried a callback.
pub fn decode_search(body: &str, callback: Option<&str>) -> Result<ContentResponse> {
    match callback.filter(|name| !name.is_empty()) {
        Some(name) => decode_content(unwrap_jsonp(body, name)?),
        None => decode_content(body),
    }
}

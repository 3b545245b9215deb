// SPDX-License-Identifier: GPL-3.0-or-later

use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use tracing::debug;

const MAX_LOGGED_BODY: usize = 5000;

/// Hook for observing the HTTP exchanges a client makes.
///
/// Called synchronously from the request path; implementations must not
/// block and must swallow their own failures.
pub trait RequestLogger: Send + Sync {
    fn log_request(&self, method: &str, url: &str, body: Option<&[u8]>);

    fn log_response(&self, status: u16, headers: &HeaderMap, body: Option<&[u8]>);

    /// Free-form event with structured fields (rate-limit backoff and similar).
    fn log_auth(&self, message: &str, fields: &Map<String, Value>);
}

/// [`RequestLogger`] emitting `tracing` debug events under the `itunes_http` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl RequestLogger for TracingLogger {
    fn log_request(&self, method: &str, url: &str, body: Option<&[u8]>) {
        match body.filter(|b| !b.is_empty()) {
            Some(body) => debug!(
                target: "itunes_http",
                method,
                url,
                request_body = %pretty_json(body),
                "HTTP Request"
            ),
            None => debug!(target: "itunes_http", method, url, "HTTP Request"),
        }
    }

    fn log_response(&self, status: u16, headers: &HeaderMap, body: Option<&[u8]>) {
        let headers = Value::Object(header_map(headers));
        match body.filter(|b| !b.is_empty()) {
            Some(body) => debug!(
                target: "itunes_http",
                status,
                headers = %headers,
                response_body = %response_body(body),
                "HTTP Response"
            ),
            None => debug!(
                target: "itunes_http",
                status,
                headers = %headers,
                "HTTP Response"
            ),
        }
    }

    fn log_auth(&self, message: &str, fields: &Map<String, Value>) {
        let fields = Value::Object(fields.clone());
        debug!(
            target: "itunes_http",
            fields = %fields,
            "{}",
            message
        );
    }
}

/// Pretty-print JSON bodies, falling back to the raw (lossy UTF-8) text.
fn pretty_json(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

fn response_body(body: &[u8]) -> String {
    if body.len() <= MAX_LOGGED_BODY {
        return pretty_json(body);
    }
    let text = String::from_utf8_lossy(body);
    let mut end = MAX_LOGGED_BODY.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &text[..end])
}

/// Single-valued headers map to strings, repeated headers to arrays.
fn header_map(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for key in headers.keys() {
        let values: Vec<Value> = headers
            .get_all(key)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let value = match <[Value; 1]>::try_from(values) {
            Ok([single]) => single,
            Err(values) => Value::Array(values),
        };
        map.insert(key.as_str().to_string(), value);
    }
    map
}

//! Hydration payload embedded in served pages.
//!
//! The payload is assigned to `window._PRELOADED_DATA_` together with a
//! `window.getPreLoadedData()` accessor. The accessor returns the data only
//! when the current location, canonicalized, equals the stored path; on any
//! other page it returns `undefined` and client code loads data itself.

use serde::Serialize;
use serde_json::Value;
use snapgate_store::canonicalize;

/// Where the hydration script goes in the HTML document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPoint {
    /// Immediately after the opening `<head>` tag.
    HeadStart,
    /// Immediately before the closing `</body>` tag.
    #[default]
    BodyEnd,
}

/// Data handed from the server-rendered page to client code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydrationPayload {
    data: Value,
    path: String,
}

impl HydrationPayload {
    /// Create a payload for `path`, canonicalizing it.
    pub fn new(data: Value, path: &str) -> Self {
        Self {
            data,
            path: canonicalize(path).to_owned(),
        }
    }

    /// Canonical path the payload belongs to.
    #[cfg(test)]
    fn path(&self) -> &str {
        &self.path
    }

    /// Data as seen by the accessor from `location_path`.
    ///
    /// Mirrors `window.getPreLoadedData()`.
    #[cfg(test)]
    fn data_for(&self, location_path: &str) -> Option<&Value> {
        (canonicalize(location_path) == self.path).then_some(&self.data)
    }

    /// Inline `<script>` element carrying the payload and accessor.
    pub fn script(&self) -> String {
        // Serializing a Value-backed struct cannot fail
        let json = serde_json::to_string(self).unwrap_or_else(|_| "null".to_owned());
        format!(
            "<script>window._PRELOADED_DATA_ = {payload};\
window.getPreLoadedData = function () {{\
var path = window.location.pathname;\
if (path.length > 1 && path.charAt(path.length - 1) === \"/\") {{ path = path.slice(0, -1); }}\
var preloaded = window._PRELOADED_DATA_;\
if (preloaded && preloaded.path === path) {{ return preloaded.data; }}\
}};</script>",
            payload = escape_script_json(&json)
        )
    }
}

/// Make serialized JSON safe inside an inline `<script>` element.
///
/// `<`, `>` and `&` become `\u003c`, `\u003e` and `\u0026`, so no closing
/// `</script` sequence or HTML comment opener can appear. U+2028 and U+2029
/// are escaped for pre-ES2019 parsers. The result is still valid JSON.
pub fn escape_script_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Insert `script` into `html` at `point`.
///
/// Tag search is ASCII case-insensitive. When the preferred anchor is
/// missing the other one is used; with neither, the script is appended.
pub fn inject(html: &str, script: &str, point: InjectionPoint) -> String {
    let lower = html.to_ascii_lowercase();
    let head = || head_content_start(&lower);
    let body = || lower.rfind("</body>");

    let offset = match point {
        InjectionPoint::HeadStart => head().or_else(body),
        InjectionPoint::BodyEnd => body().or_else(head),
    };

    let mut out = String::with_capacity(html.len() + script.len());
    match offset {
        Some(at) => {
            out.push_str(&html[..at]);
            out.push_str(script);
            out.push_str(&html[at..]);
        }
        None => {
            out.push_str(html);
            out.push_str(script);
        }
    }
    out
}

/// Byte offset just past the opening `<head>` tag (skipping `<header>`).
fn head_content_start(lower: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(found) = lower[from..].find("<head") {
        let after = from + found + "<head".len();
        match lower.as_bytes().get(after) {
            Some(b'>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() => {
                return lower[after..].find('>').map(|close| after + close + 1);
            }
            _ => from = after,
        }
    }
    None
}

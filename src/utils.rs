//! Small string helpers for URL assembly, log output, and error reporting.

use std::error::Error;

/// Strip a single trailing `/` from a base URL.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(trim_trailing_slash("http://example.com/base/"), "http://example.com/base");
/// assert_eq!(trim_trailing_slash("http://example.com/base"), "http://example.com/base");
/// ```
pub fn trim_trailing_slash(s: &str) -> String {
    s.strip_suffix('/').unwrap_or(s).to_string()
}

/// Join a base URL and a path suffix with exactly one `/` between them.
///
/// An empty suffix yields the base unchanged.
pub fn join_path(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` characters and get a
/// `"…(+N bytes)"` marker appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Render an error followed by every cause not already in its message.
///
/// Wrapping errors here embed their source in `Display`, but transport
/// errors hide the underlying cause (e.g. "connection refused") behind
/// `source()`.
pub fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

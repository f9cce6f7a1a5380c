//! Percent-encoding helpers for query components.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Same set a browser's `encodeURIComponent` escapes.
///
/// Space becomes `%20`, never `+`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a query key or value.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(encode_component("new file.pdf"), "new%20file.pdf");
/// assert_eq!(encode_component("a/b"), "a%2Fb");
/// ```
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Decodes `%XX` escapes, leaving `+` untouched.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn decode_component(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

//! Character encoding of saved page snapshots.
//!
//! Browsers save pages in whatever charset the site declared. Snapshots are
//! decoded to UTF-8 before parsing: a byte-order mark wins, then a `<meta>`
//! charset declaration in the first KiB, then UTF-8.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// Bytes examined for a charset declaration.
const SNIFF_LEN: usize = 1024;

/// `<meta charset=...>` or `<meta http-equiv="Content-Type" content="...; charset=...">`
#[allow(clippy::expect_used)]
static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_.:-]+)"#).expect("valid regex")
});

/// Declared charset label in the document head, if any.
fn declared_charset(head: &str) -> Option<&str> {
    META_CHARSET_RE
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Encoding of an HTML snapshot.
#[must_use]
pub fn detect_encoding(html: &[u8]) -> &'static Encoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(html) {
        return encoding;
    }

    let head = String::from_utf8_lossy(&html[..html.len().min(SNIFF_LEN)]);
    declared_charset(&head)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8)
}

/// Decode a snapshot to UTF-8.
///
/// Undecodable bytes become U+FFFD rather than failing.
///
/// # Examples
///
/// ```
/// use rs_thread_harvest::encoding::transcode_to_utf8;
///
/// let html = b"<html><body>Hello, World!</body></html>";
/// assert!(transcode_to_utf8(html).contains("Hello, World!"));
/// ```
#[must_use]
pub fn transcode_to_utf8(html: &[u8]) -> String {
    let (decoded, _used, _had_errors) = detect_encoding(html).decode(html);
    decoded.into_owned()
}

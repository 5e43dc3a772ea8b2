// Single-string normalization: strip URLs, collapse whitespace, trim.

use std::sync::LazyLock;

use regex_lite::Regex;

// A URL runs from its scheme up to the next whitespace character. The
// negated class lists the same characters `char::is_whitespace` accepts, so
// the URL boundary agrees with the whitespace collapsing below.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "https?://[^\\s\u{85}\u{a0}\u{1680}\u{2000}-\u{200a}\u{2028}\u{2029}\u{202f}\u{205f}\u{3000}]+",
    )
    .expect("URL pattern is a valid regex")
});

/// Normalize a single piece of post text.
///
/// Every `http://` / `https://` URL is removed, every run of whitespace
/// (spaces, tabs, newlines, Unicode spaces) becomes one ASCII space, and
/// the result is trimmed. Pure and total: never fails.
pub fn normalize(text: &str) -> String {
    let without_urls = URL_PATTERN.replace_all(text, "");
    without_urls.split_whitespace().collect::<Vec<_>>().join(" ")
}

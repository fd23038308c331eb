//! Static discovery of `require("literal")` calls.
//!
//! This is a pattern match over source text, not a parse. Only calls whose single
//! argument is a string literal without whitespace, quotes or `)` are found;
//! computed specifiers are invisible. Member calls such as `loader.require(...)`
//! and identifiers ending in `require` are skipped.

use once_cell::sync::Lazy;
use regex::Regex;

static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[^.$\w])require\s*\(\s*(?:"([^"'\s)]+)"|'([^"'\s)]+)')\s*\)"#)
        .expect("require pattern is valid")
});

/// Specifiers of every literal `require` call in `source`, in source order.
pub fn scan_requires(source: &str) -> Vec<&str> {
    REQUIRE_CALL
        .captures_iter(source)
        .filter_map(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map(|specifier| specifier.as_str())
        .collect()
}

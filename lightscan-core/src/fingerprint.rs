// Technology hints from the first fetched page. Not findings, only a summary
// for the report.

use indexmap::IndexMap;
use lightscan_scanner::Page;

/// Response headers copied into the stack summary when present.
pub const FINGERPRINT_HEADERS: &[&str] =
    &["Server", "X-Powered-By", "Via", "X-AspNet-Version", "X-Generator"];

/// `(substring in HTML, technology)` pairs, checked in order.
pub const HTML_HINTS: &[(&str, &str)] = &[
    ("wp-content", "WordPress"),
    ("Drupal.settings", "Drupal"),
    ("content=\"Joomla!", "Joomla"),
];

pub const HTML_HINTS_KEY: &str = "HTML-Hints";

pub fn fingerprint_stack(pages: &IndexMap<String, Page>) -> IndexMap<String, String> {
    let mut stack = IndexMap::new();
    let Some((_, first)) = pages.first() else {
        return stack;
    };

    for header in FINGERPRINT_HEADERS {
        if let Some(value) = first.headers.get(header) {
            stack.insert(header.to_string(), value.to_string());
        }
    }

    let hints: Vec<&str> = HTML_HINTS
        .iter()
        .filter(|(needle, _)| first.content.contains(needle))
        .map(|(_, label)| *label)
        .collect();
    if !hints.is_empty() {
        stack.insert(HTML_HINTS_KEY.to_string(), hints.join(", "));
    }

    stack
}

//! Whitespace normalization for the prose around code placeholders.

use std::sync::LazyLock;

use regex::Regex;

static HORIZONTAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// A line break with any whitespace around it, including following blank lines.
static LINE_BREAK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n\s*").expect("valid regex"));

/// Collapse blank-line runs to one line break, space/tab runs to one space, and trim.
///
/// Placeholder tokens contain no whitespace, so they pass through untouched and in order.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_RUN.replace_all(&text, " ");
    let text = LINE_BREAK_RUN.replace_all(&text, "\n");
    text.trim().to_string()
}

//! Fenced code extraction: swap each ```lang ... ``` region for a placeholder token.

const FENCE: &str = "```";

/// Opens a placeholder token. Private-use code point, never produced by the answer sources.
pub(crate) const PLACEHOLDER_OPEN: char = '\u{E000}';
/// Closes a placeholder token.
pub(crate) const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Language used when an opening fence carries no tag.
const DEFAULT_LANGUAGE: &str = "code";

/// One fenced code listing, body kept verbatim apart from surrounding blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListing {
    pub language: String,
    pub body: String,
}

impl CodeListing {
    /// Display form of the listing: `"<LANGUAGE> Code:\n<body>"`.
    pub fn rendered(&self) -> String {
        format!("{} Code:\n{}", self.language.to_uppercase(), self.body)
    }
}

/// Text with placeholders plus the listings they stand for, in order of appearance.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub text: String,
    pub listings: Vec<CodeListing>,
}

/// Placeholder token for the listing at `index`. Contains no whitespace.
pub(crate) fn placeholder(index: usize) -> String {
    format!("{}CODE{}{}", PLACEHOLDER_OPEN, index, PLACEHOLDER_CLOSE)
}

enum ScanState {
    InProse,
    InFence {
        /// Byte offset of the opening marker.
        open: usize,
        language: String,
        body_start: usize,
    },
}

/// Extract fenced code listings from `raw`.
///
/// Each well-formed fence (opening marker, content, closing marker) becomes one
/// [`CodeListing`] and is replaced, fence lines included, by a placeholder. An
/// opening marker with no matching close is left in the text as-is.
pub fn extract(raw: &str) -> Extracted {
    let mut out = Extracted::default();
    let mut pos = 0;
    let mut state = ScanState::InProse;

    loop {
        match state {
            ScanState::InProse => {
                let Some(rel) = raw[pos..].find(FENCE) else {
                    push_prose(&mut out.text, &raw[pos..]);
                    break;
                };
                let open = pos + rel;
                push_prose(&mut out.text, &raw[pos..open]);
                let (language, body_start) = parse_opening(raw, open + FENCE.len());
                state = ScanState::InFence {
                    open,
                    language,
                    body_start,
                };
            }
            ScanState::InFence {
                open,
                language,
                body_start,
            } => {
                let Some(rel) = raw[body_start..].find(FENCE) else {
                    log::debug!("unterminated code fence at byte {}, kept as text", open);
                    push_prose(&mut out.text, &raw[open..]);
                    break;
                };
                let close = body_start + rel;
                out.text.push_str(&placeholder(out.listings.len()));
                out.listings.push(CodeListing {
                    language,
                    body: trim_blank_lines(&raw[body_start..close]).to_string(),
                });
                pos = close + FENCE.len();
                state = ScanState::InProse;
            }
        }
    }
    out
}

/// Parse the rest of an opening fence line starting at `after_marker`.
/// Returns the language and the byte offset where the body begins.
///
/// The leading word of the line is the language; anything after it (a title,
/// attributes) is dropped. A line that closes on itself, or starts with
/// something that is not a tag, is an inline fence.
fn parse_opening(raw: &str, after_marker: usize) -> (String, usize) {
    let rest = &raw[after_marker..];
    let line_end = rest.find('\n');
    let line = &rest[..line_end.unwrap_or(rest.len())];
    let body_start = match line_end {
        Some(nl) => after_marker + nl + 1,
        None => raw.len(),
    };
    if line.contains(FENCE) {
        return (DEFAULT_LANGUAGE.to_string(), after_marker);
    }
    match line.split_whitespace().next() {
        None => (DEFAULT_LANGUAGE.to_string(), body_start),
        Some(tag) if is_language_tag(tag) => (tag.to_string(), body_start),
        // Inline fence such as ```x = (1, 2)```: the body starts right after the marker.
        Some(_) => (DEFAULT_LANGUAGE.to_string(), after_marker),
    }
}

fn is_language_tag(tag: &str) -> bool {
    tag.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '+' | '#' | '-' | '.'))
}

/// Drop leading blank lines and all trailing whitespace. Indentation of the first
/// non-blank line is kept.
fn trim_blank_lines(body: &str) -> &str {
    let mut start = 0;
    for line in body.split_inclusive('\n') {
        if !line.trim().is_empty() {
            break;
        }
        start += line.len();
    }
    body[start..].trim_end()
}

/// Append prose, dropping any placeholder sentinels so tokens stay unique.
fn push_prose(out: &mut String, prose: &str) {
    out.extend(
        prose
            .chars()
            .filter(|c| *c != PLACEHOLDER_OPEN && *c != PLACEHOLDER_CLOSE),
    );
}

//! Chunk segmentation: group prose sentences into display-sized chunks, keep code whole.

use serde::Serialize;

use super::error::FormatError;
use super::fence::{CodeListing, PLACEHOLDER_CLOSE, PLACEHOLDER_OPEN};

/// One screen update for the glasses display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayChunk {
    /// 0-based position in the presentation.
    pub index: usize,
    pub total_count: usize,
    pub text: String,
    /// Produced from a code listing; exempt from the chunk length cap.
    pub contains_code: bool,
    /// Time the chunk stays on screen, assigned by the display pacing.
    pub duration_ms: u64,
}

impl DisplayChunk {
    /// A one-chunk presentation of `text`.
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            index: 0,
            total_count: 1,
            text: text.into(),
            contains_code: false,
            duration_ms: 0,
        }
    }
}

/// Piece of the normalized text stream.
#[derive(Debug)]
enum Unit<'a> {
    Prose(&'a str),
    Code(&'a CodeListing),
}

/// Split normalized text into chunks of at most `max_chunk_length` characters.
///
/// Prose is grouped sentence by sentence; a sentence longer than the cap becomes
/// its own oversized chunk instead of being cut. Every code listing becomes its
/// own chunk regardless of length. Fails when placeholders and `listings` disagree.
pub fn segment(
    text: &str,
    listings: &[CodeListing],
    max_chunk_length: usize,
) -> Result<Vec<DisplayChunk>, FormatError> {
    let units = split_units(text, listings)?;
    let mut pieces: Vec<(String, bool)> = Vec::new();
    let mut buffer = ProseBuffer::new(max_chunk_length);

    for unit in units {
        match unit {
            Unit::Prose(prose) => {
                for sentence in split_sentences(prose) {
                    let sentence = sentence.replace('\n', " ");
                    if let Some(done) = buffer.push(&sentence) {
                        pieces.push((done, false));
                    }
                }
            }
            Unit::Code(listing) => {
                if let Some(done) = buffer.take() {
                    pieces.push((done, false));
                }
                pieces.push((listing.rendered(), true));
            }
        }
    }
    if let Some(done) = buffer.take() {
        pieces.push((done, false));
    }

    let total_count = pieces.len();
    log::debug!(
        "segmented {} chars into {} chunk(s), {} code listing(s)",
        text.chars().count(),
        total_count,
        listings.len()
    );
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, (text, contains_code))| DisplayChunk {
            index,
            total_count,
            text,
            contains_code,
            duration_ms: 0,
        })
        .collect())
}

/// Accumulates whole sentences up to the length cap.
struct ProseBuffer {
    text: String,
    len: usize,
    max: usize,
}

impl ProseBuffer {
    fn new(max: usize) -> Self {
        Self {
            text: String::new(),
            len: 0,
            max,
        }
    }

    /// Add a sentence. Returns the previous contents when they had to be flushed.
    fn push(&mut self, sentence: &str) -> Option<String> {
        let len = sentence.chars().count();
        if self.text.is_empty() {
            self.text.push_str(sentence);
            self.len = len;
            return None;
        }
        if self.len + 1 + len <= self.max {
            self.text.push(' ');
            self.text.push_str(sentence);
            self.len += 1 + len;
            return None;
        }
        let done = self.take();
        self.text.push_str(sentence);
        self.len = len;
        done
    }

    fn take(&mut self) -> Option<String> {
        if self.text.is_empty() {
            return None;
        }
        self.len = 0;
        Some(std::mem::take(&mut self.text))
    }
}

/// Walk the text as alternating prose spans and code units, checking that every
/// listing is referenced exactly once.
fn split_units<'a>(
    text: &'a str,
    listings: &'a [CodeListing],
) -> Result<Vec<Unit<'a>>, FormatError> {
    let mut units = Vec::new();
    let mut seen = vec![false; listings.len()];
    let mut pos = 0;

    while let Some(rel) = text[pos..].find(PLACEHOLDER_OPEN) {
        let open = pos + rel;
        push_prose(&mut units, text, pos, open)?;
        let inner_start = open + PLACEHOLDER_OPEN.len_utf8();
        let close = text[inner_start..]
            .find(PLACEHOLDER_CLOSE)
            .map(|r| inner_start + r)
            .ok_or(FormatError::MalformedPlaceholder { offset: open })?;
        let index = text[inner_start..close]
            .strip_prefix("CODE")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or(FormatError::MalformedPlaceholder { offset: open })?;
        let listing = listings
            .get(index)
            .ok_or(FormatError::UnknownPlaceholder { index })?;
        if std::mem::replace(&mut seen[index], true) {
            return Err(FormatError::DuplicatePlaceholder { index });
        }
        units.push(Unit::Code(listing));
        pos = close + PLACEHOLDER_CLOSE.len_utf8();
    }
    push_prose(&mut units, text, pos, text.len())?;

    if let Some(index) = seen.iter().position(|s| !s) {
        return Err(FormatError::MissingPlaceholder { index });
    }
    Ok(units)
}

fn push_prose<'a>(
    units: &mut Vec<Unit<'a>>,
    text: &'a str,
    start: usize,
    end: usize,
) -> Result<(), FormatError> {
    let prose = &text[start..end];
    if let Some(stray) = prose.find(PLACEHOLDER_CLOSE) {
        return Err(FormatError::MalformedPlaceholder {
            offset: start + stray,
        });
    }
    if !prose.trim().is_empty() {
        units.push(Unit::Prose(prose));
    }
    Ok(())
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Characters that stay attached to the sentence they close.
fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

/// Split prose into trimmed sentences.
///
/// A sentence ends at a run of `.`, `!`, `?` (plus closing quotes/brackets)
/// followed by whitespace or the end of the text, so `6.188` stays whole. Line
/// breaks are ordinary whitespace: a hard-wrapped sentence stays one sentence.
/// Abbreviations such as "e.g. this" still split.
pub(crate) fn split_sentences(prose: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = prose.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminator(next) && !is_closer(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        let at_boundary = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if at_boundary {
            push_sentence(&mut out, &prose[start..end]);
            start = end;
        }
    }
    push_sentence(&mut out, &prose[start..]);
    out
}

fn push_sentence<'a>(out: &mut Vec<&'a str>, sentence: &'a str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        out.push(sentence);
    }
}

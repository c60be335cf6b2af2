//! Answer formatting for the glasses display: code extraction, whitespace
//! normalization and chunk segmentation.
//!
//! The stages are pure and run synchronously; pacing and presentation live in
//! [`crate::core::display`].

mod error;
mod fence;
mod normalize;
mod segment;

pub use error::FormatError;
pub use fence::extract;
pub use normalize::normalize;
pub use segment::{DisplayChunk, segment};

/// Shown instead of an empty presentation.
pub const FALLBACK_NOTICE: &str =
    "How can I help you? Please let me know what you need assistance with.";

/// Run the full pipeline on a raw answer: extract code, normalize prose, segment.
///
/// An empty or whitespace-only answer yields the single [`FALLBACK_NOTICE`] chunk,
/// so the result is never empty.
pub fn prepare(raw: &str, max_chunk_length: usize) -> Result<Vec<DisplayChunk>, FormatError> {
    if raw.trim().is_empty() {
        log::debug!("empty answer, using fallback notice");
        return Ok(vec![DisplayChunk::single(FALLBACK_NOTICE)]);
    }
    let extracted = extract(raw);
    let text = normalize(&extracted.text);
    let chunks = segment(&text, &extracted.listings, max_chunk_length)?;
    if chunks.is_empty() {
        return Ok(vec![DisplayChunk::single(FALLBACK_NOTICE)]);
    }
    Ok(chunks)
}

/// Last-resort presentation when [`prepare`] fails: the raw answer as one chunk.
pub fn unprocessed(raw: &str) -> Vec<DisplayChunk> {
    let text = raw.trim();
    if text.is_empty() {
        return vec![DisplayChunk::single(FALLBACK_NOTICE)];
    }
    vec![DisplayChunk::single(text)]
}

#[cfg(test)]
mod tests;

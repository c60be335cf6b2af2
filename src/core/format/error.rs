//! Formatting pipeline errors.

/// Placeholders and listings disagree after extraction/normalization.
///
/// These indicate a broken contract between pipeline stages; callers should fall
/// back to the unprocessed answer rather than show nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("code listing {index} has no placeholder in the text")]
    MissingPlaceholder { index: usize },
    #[error("placeholder {index} does not match any code listing")]
    UnknownPlaceholder { index: usize },
    #[error("placeholder {index} appears more than once")]
    DuplicatePlaceholder { index: usize },
    #[error("malformed placeholder at byte {offset}")]
    MalformedPlaceholder { offset: usize },
}

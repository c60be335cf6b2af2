//! Voice activation: decide whether a transcript addresses the assistant and
//! pull out the question.

/// Phrases that invoke the assistant, checked in order (longer phrases first
/// where they overlap).
const ACTIVATION_PHRASES: &[&str] = &[
    "ask ai",
    "hey ai",
    "ai help",
    "question ai",
    "can you repeat",
    "repeat please",
    "repeat that",
    "say that again",
    "i didn't understand",
    "explain that",
    "what do you mean",
    "ai",
    "help me",
    "help",
    "what is",
    "tell me about",
    "how do i",
    "can you",
    "please help",
];

const REPEAT_PHRASES: &[&str] = &["can you repeat", "repeat please", "repeat that", "say that again"];

/// Phrases that start the question itself and are kept in it.
const QUESTION_PHRASES: &[&str] = &["what is", "tell me about", "how do i", "can you"];

const HELP_QUESTION: &str = "What can you help me with?";
const GREETING_QUESTION: &str = "Hello, how can I assist you today?";
const DEFAULT_QUESTION: &str = "How can I help you?";

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    /// Show the previous answer again.
    Repeat,
}

/// Parse a final transcript. Returns `None` when no activation phrase is present.
pub fn parse_command(transcript: &str) -> Option<Command> {
    let text = transcript.trim();
    let lower = text.to_lowercase();
    let (phrase, pos) = ACTIVATION_PHRASES
        .iter()
        .find_map(|phrase| find_phrase(&lower, phrase).map(|pos| (*phrase, pos)))?;

    // Slice the original text when lowercasing kept byte offsets, else the lowered copy.
    let source = if lower.len() == text.len() { text } else { lower.as_str() };
    let question_start = if QUESTION_PHRASES.contains(&phrase) {
        pos
    } else {
        pos + phrase.len()
    };
    let after = source
        .get(question_start..)
        .unwrap_or("")
        .trim_start_matches([',', ':', '.', '!', '?', ' '])
        .trim();
    let after_phrase = source.get(pos + phrase.len()..).unwrap_or("").trim();

    if after_phrase.chars().count() > 2 {
        return Some(Command::Ask(after.to_string()));
    }
    if REPEAT_PHRASES.contains(&phrase) {
        return Some(Command::Repeat);
    }
    if lower.contains("help") {
        return Some(Command::Ask(HELP_QUESTION.to_string()));
    }
    if phrase == "ai" {
        return Some(Command::Ask(GREETING_QUESTION.to_string()));
    }
    if looks_like_question(&lower) {
        return Some(Command::Ask(text.to_string()));
    }
    Some(Command::Ask(DEFAULT_QUESTION.to_string()))
}

/// Byte offset of `phrase` in `lower` at word boundaries.
fn find_phrase(lower: &str, phrase: &str) -> Option<usize> {
    lower.match_indices(phrase).map(|(pos, _)| pos).find(|&pos| {
        let before = lower[..pos].chars().next_back();
        let after = lower[pos + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn looks_like_question(lower: &str) -> bool {
    lower.contains('?')
        || ["what", "how", "when", "where", "why"]
            .iter()
            .any(|w| lower.contains(w))
}

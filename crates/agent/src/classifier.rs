//! Retrieval necessity classifier.

use ragwise_core::message::Message;

/// Openers that mark small talk rather than a knowledge question.
const CONVERSATIONAL_FILLERS: [&str; 15] = [
    "hello",
    "hi",
    "hey",
    "greetings",
    "how are you",
    "what's up",
    "good morning",
    "good afternoon",
    "good evening",
    "thanks",
    "thank you",
    "bye",
    "goodbye",
    "ok",
    "okay",
];

/// True when `text` begins with `filler` as a whole word or phrase, so
/// "hi there" matches "hi" but "hierarchical clustering" does not.
fn starts_with_filler(text: &str, filler: &str) -> bool {
    text.strip_prefix(filler)
        .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_alphanumeric()))
}

/// Whether a message should trigger a knowledge-base lookup.
pub fn needs_retrieval(latest: &Message) -> bool {
    needs_retrieval_text(&latest.content)
}

/// [`needs_retrieval`] over raw text.
pub fn needs_retrieval_text(text: &str) -> bool {
    let query = text.trim().to_lowercase();
    if query.is_empty() {
        return false;
    }

    if CONVERSATIONAL_FILLERS
        .iter()
        .any(|filler| starts_with_filler(&query, filler))
    {
        return false;
    }

    // Very short statements are chit-chat unless phrased as a question.
    if query.split_whitespace().count() < 3 && !query.contains('?') {
        return false;
    }

    true
}

//! Plain-text rendering of retrieved passages for the language model.

use ragwise_core::retrieval::RetrievedPassage;

/// Characters of passage content shown per result.
pub const SNIPPET_CHARS: usize = 500;

pub const NO_RESULTS: &str = "No relevant information found.";
pub const NO_FILTERED_RESULTS: &str = "No relevant information found with the specified filters.";
pub const SEARCH_ERROR: &str = "Error during search. Please try again.";
pub const SEARCH_UNAVAILABLE: &str = "Search service unavailable. Please try again later.";

/// The longest prefix of `s` with at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

fn title(p: &RetrievedPassage) -> &str {
    or_default(&p.title, "No title")
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

/// Title, department, type, source and a snippet of each passage.
pub fn summary(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return NO_RESULTS.to_string();
    }
    passages
        .iter()
        .map(|p| {
            format!(
                "📄 Title: {}\n🏢 Department: {} | Type: {}\n🔗 Source: {}\n📝 Content: {}...",
                title(p),
                field(&p.metadata.department),
                field(&p.metadata.doc_type),
                or_default(&p.source, "Unknown"),
                truncate_chars(&p.content, SNIPPET_CHARS),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Like [`summary`] but with the full metadata line used for filtered hits.
pub fn filtered(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return NO_FILTERED_RESULTS.to_string();
    }
    passages
        .iter()
        .map(|p| {
            let year = p
                .metadata
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "N/A".into());
            format!(
                "📄 {}\n🏢 {} | 📁 {} | 📅 {} | 🔒 {}\n📝 {}...",
                title(p),
                field(&p.metadata.department),
                field(&p.metadata.doc_type),
                year,
                field(&p.metadata.security_level),
                truncate_chars(&p.content, SNIPPET_CHARS),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Untruncated rendering, used by the enhanced retrieval endpoint.
pub fn full(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return NO_RESULTS.to_string();
    }
    passages
        .iter()
        .map(|p| {
            format!(
                "📄 Title: {}\n🏢 Department: {} | Type: {}\n🔗 Source: {}\n📝 Content: {}",
                title(p),
                field(&p.metadata.department),
                field(&p.metadata.doc_type),
                or_default(&p.source, "Unknown"),
                p.content,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Terse rendering of the results of a fallback search.
pub fn fallback(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return SEARCH_ERROR.to_string();
    }
    passages
        .iter()
        .map(|p| {
            format!(
                "📄 {}:\n{}...\n\n",
                title(p),
                truncate_chars(&p.content, SNIPPET_CHARS)
            )
        })
        .collect()
}

//! Free-text filter extraction.
//!
//! Matching is case-insensitive and order-sensitive: every table below is
//! scanned top to bottom and the first hit wins. A phrase hits either as a
//! substring of the query ("exact") or when any of its words is one of the
//! query's whitespace tokens ("partial").

use ragwise_core::retrieval::{Department, DocType, FilterSet, SecurityLevel};
use regex_lite::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

const DEPARTMENT_PHRASES: [(&str, Department); 8] = [
    ("ai research", Department::AiResearch),
    ("ml engineering", Department::MlEngineering),
    ("data science", Department::DataScience),
    ("product", Department::Product),
    ("engineering", Department::Engineering),
    ("r&d", Department::RnD),
    ("analytics", Department::Analytics),
    ("platform", Department::Platform),
];

// Canonical phrases first, then the generic aliases.
const DOC_TYPE_PHRASES: [(&str, DocType); 13] = [
    ("research paper", DocType::ResearchPaper),
    ("technical guide", DocType::TechnicalGuide),
    ("api documentation", DocType::ApiDocumentation),
    ("best practices", DocType::BestPractices),
    ("implementation guide", DocType::ImplementationGuide),
    ("technical report", DocType::TechnicalReport),
    ("system design", DocType::SystemDesign),
    ("tutorial", DocType::Tutorial),
    ("paper", DocType::ResearchPaper),
    ("guide", DocType::TechnicalGuide),
    ("documentation", DocType::ApiDocumentation),
    ("report", DocType::TechnicalReport),
    ("design", DocType::SystemDesign),
];

const RECENCY_WORDS: [&str; 4] = ["recent", "latest", "new", "current"];

const SECURITY_WORDS: [(&str, SecurityLevel); 5] = [
    ("confidential", SecurityLevel::Confidential),
    ("secret", SecurityLevel::Secret),
    ("internal", SecurityLevel::Internal),
    ("public", SecurityLevel::Public),
    ("restricted", SecurityLevel::Restricted),
];

/// The year pattern: a standalone 4-digit token in 2010–2029.
pub const YEAR_PATTERN: &str = r"\b(20[1-2][0-9])\b";

static YEAR_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(YEAR_PATTERN).ok());

/// How a table phrase matched a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Partial,
    None,
}

fn match_kind(phrase: &str, lowered: &str, tokens: &[&str]) -> MatchKind {
    if lowered.contains(phrase) {
        MatchKind::Exact
    } else if phrase.split_whitespace().any(|w| tokens.contains(&w)) {
        MatchKind::Partial
    } else {
        MatchKind::None
    }
}

fn first_hit<T: Copy>(table: &[(&str, T)], lowered: &str, tokens: &[&str]) -> Option<T> {
    table
        .iter()
        .find(|(phrase, _)| match_kind(phrase, lowered, tokens) != MatchKind::None)
        .map(|(_, value)| *value)
}

/// Every year-like token in the query, in order of appearance.
fn years_in(query: &str) -> Vec<i32> {
    let Some(re) = YEAR_RE.as_ref() else {
        return Vec::new();
    };
    re.find_iter(query)
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Tokens with surrounding punctuation removed, for whole-word lookups.
fn bare_words(lowered: &str) -> Vec<&str> {
    lowered
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Extract metadata filters from a free-text query.
///
/// Never fails; a field is set only when the query supports it. A recency
/// word ("recent", "latest", "new", "current") stands in for `current_year`
/// when the query names no explicit year.
pub fn extract_filters(query: &str, current_year: i32) -> FilterSet {
    let lowered = query.trim().to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    let words = bare_words(&lowered);

    let mut filters = FilterSet {
        department: first_hit(&DEPARTMENT_PHRASES, &lowered, &tokens),
        doc_type: first_hit(&DOC_TYPE_PHRASES, &lowered, &tokens),
        year: years_in(query).into_iter().next(),
        security_level: SECURITY_WORDS
            .iter()
            .find(|(w, _)| words.contains(w))
            .map(|(_, level)| *level),
    };

    if filters.year.is_none() && RECENCY_WORDS.iter().any(|w| words.contains(w)) {
        filters.year = Some(current_year);
    }

    debug!(query, filters = ?filters, "Extracted filters");
    filters
}

/// Match result for one table entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryMatch {
    pub value: &'static str,
    pub found: bool,
    pub match_type: MatchKind,
}

/// A per-entry explanation of what [`extract_filters`] saw in a query.
#[derive(Debug, Clone, Serialize)]
pub struct FilterAnalysis {
    pub query_lowercase: String,
    pub words_in_query: Vec<String>,
    pub departments: Vec<EntryMatch>,
    pub document_types: Vec<EntryMatch>,
    pub found_years: Vec<i32>,
    pub year_pattern: &'static str,
}

/// Explain how each canonical department and document type matches `query`.
pub fn analyze_filters(query: &str) -> FilterAnalysis {
    let lowered = query.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    let entries = |phrases: &[&'static str]| -> Vec<EntryMatch> {
        phrases
            .iter()
            .map(|phrase| {
                let kind = match_kind(phrase, &lowered, &tokens);
                EntryMatch {
                    value: *phrase,
                    found: kind != MatchKind::None,
                    match_type: kind,
                }
            })
            .collect()
    };

    let departments: Vec<&'static str> = DEPARTMENT_PHRASES.iter().map(|(p, _)| *p).collect();
    // Aliases are left out: they only exist to back the canonical types.
    let doc_types: Vec<&'static str> = DOC_TYPE_PHRASES[..DocType::ALL.len()]
        .iter()
        .map(|(p, _)| *p)
        .collect();

    FilterAnalysis {
        words_in_query: tokens.iter().map(|t| t.to_string()).collect(),
        departments: entries(&departments),
        document_types: entries(&doc_types),
        found_years: years_in(query),
        year_pattern: YEAR_PATTERN,
        query_lowercase: lowered.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_doc_type_and_year() {
        let f = extract_filters("AI research papers from 2023", 2024);
        assert_eq!(f.department, Some(Department::AiResearch));
        assert_eq!(f.doc_type, Some(DocType::ResearchPaper));
        assert_eq!(f.year, Some(2023));
        assert_eq!(f.security_level, None);
    }

    #[test]
    fn recency_uses_current_year() {
        let f = extract_filters("latest ML engineering guide", 2024);
        assert_eq!(f.department, Some(Department::MlEngineering));
        assert_eq!(f.doc_type, Some(DocType::TechnicalGuide));
        assert_eq!(f.year, Some(2024));

        let f = extract_filters("what's current in analytics?", 2026);
        assert_eq!(f.year, Some(2026));
    }

    #[test]
    fn explicit_year_beats_recency() {
        let f = extract_filters("latest platform report 2021", 2024);
        assert_eq!(f.year, Some(2021));
        assert_eq!(f.department, Some(Department::Platform));
        assert_eq!(f.doc_type, Some(DocType::TechnicalReport));
    }

    #[test]
    fn partial_word_matches_first_entry_in_order() {
        // "engineering" is a word of "ml engineering", which comes first
        let f = extract_filters("engineering onboarding notes", 2024);
        assert_eq!(f.department, Some(Department::MlEngineering));
    }

    #[test]
    fn security_word_is_title_cased_level() {
        let f = extract_filters("Show me restricted documents, please", 2024);
        assert_eq!(f.security_level, Some(SecurityLevel::Restricted));
        let f = extract_filters("internal: deployment checklist", 2024);
        assert_eq!(f.security_level, Some(SecurityLevel::Internal));
    }

    #[test]
    fn years_outside_range_ignored() {
        assert_eq!(extract_filters("trends since 2009 and 2030", 2024).year, None);
        assert_eq!(extract_filters("FY20235 numbers", 2024).year, None);
        assert_eq!(extract_filters("the 2019, 2022 reviews", 2024).year, Some(2019));
    }

    #[test]
    fn recency_words_are_whole_words() {
        // "newsletter" and "renew" do not imply recency
        let f = extract_filters("renew the newsletter subscription", 2024);
        assert_eq!(f.year, None);
    }

    #[test]
    fn no_signal_yields_empty_filter() {
        let f = extract_filters("how do transformers handle long sequences", 2024);
        assert!(f.is_empty());
        assert!(extract_filters("", 2024).is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let q = "Data science best practices 2024";
        assert_eq!(extract_filters(q, 2024), extract_filters(q, 2024));
    }

    #[test]
    fn analysis_reports_match_kinds() {
        let a = analyze_filters("AI research papers from 2023");
        let ai = a.departments.iter().find(|e| e.value == "ai research").unwrap();
        assert_eq!(ai.match_type, MatchKind::Exact);
        let rp = a
            .document_types
            .iter()
            .find(|e| e.value == "research paper")
            .unwrap();
        assert_eq!(rp.match_type, MatchKind::Exact);
        let analytics = a.departments.iter().find(|e| e.value == "analytics").unwrap();
        assert!(!analytics.found);
        assert_eq!(a.document_types.len(), 8);
        assert_eq!(a.found_years, vec![2023]);
    }

    #[test]
    fn analysis_reports_partial_match() {
        let a = analyze_filters("system overview");
        let sd = a
            .document_types
            .iter()
            .find(|e| e.value == "system design")
            .unwrap();
        assert_eq!(sd.match_type, MatchKind::Partial);
        assert_eq!(serde_json::to_value(sd).unwrap()["match_type"], "partial");
    }
}

//! Context selection: compress retrieved passages into a bounded budget.
//!
//! Passages are ranked by how often the query's words occur in them and
//! concatenated greedily, highest score first, until the next passage
//! would overflow the character budget.

/// Per-passage cap applied before ranking.
pub const PASSAGE_CHARS: usize = 1200;

const SEPARATOR: &str = "\n\n";

/// Lower-cased word tokens of `query` longer than two characters.
fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn score(candidate: &str, terms: &[String]) -> usize {
    let lowered = candidate.to_lowercase();
    terms.iter().map(|t| lowered.matches(t.as_str()).count()).sum()
}

/// Rank and pack `passages` into at most `max_chars` characters.
///
/// Returns an empty string only when there is nothing to select from.
pub fn select_context<S: AsRef<str>>(passages: &[S], query: &str, max_chars: usize) -> String {
    let candidates: Vec<&str> = passages
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty())
        .map(|p| truncate(p, PASSAGE_CHARS))
        .collect();

    let Some(first) = candidates.first().copied() else {
        return String::new();
    };

    let terms = query_terms(query);
    let mut ranked: Vec<(usize, &str)> = candidates.iter().map(|c| (score(c, &terms), *c)).collect();

    // Nothing matches the query: the first candidate alone, not a greedy fill.
    if ranked.iter().all(|(s, _)| *s == 0) {
        return truncate(first, max_chars).to_string();
    }

    // Stable: equal scores keep retrieval order.
    ranked.sort_by(|a, b| b.0.cmp(&a.0));

    let mut selected: Vec<&str> = Vec::new();
    let mut total = 0;
    for (_, candidate) in ranked {
        let sep = if selected.is_empty() { 0 } else { SEPARATOR.len() };
        let len = candidate.chars().count();
        if total + sep + len > max_chars {
            break;
        }
        total += sep + len;
        selected.push(candidate);
    }

    if selected.is_empty() {
        return truncate(first, max_chars).to_string();
    }

    selected.join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevant_passage_ranks_first() {
        let noise = "ab ".repeat(3000);
        let passages = vec![noise.as_str(), "machine learning is great"];
        let out = select_context(&passages, "machine learning", 5000);
        assert!(out.starts_with("machine learning is great"));
        assert!(out.contains(SEPARATOR));
    }

    #[test]
    fn passages_are_capped_before_ranking() {
        let long = format!("vector {}", "x".repeat(5000));
        let out = select_context(&[long], "vector search", 5000);
        assert_eq!(out.chars().count(), PASSAGE_CHARS);
    }

    #[test]
    fn budget_stops_greedy_fill() {
        let a = "kubernetes ".repeat(30);
        let b = "kubernetes rollout".to_string();
        let out = select_context(&[a.clone(), b], "kubernetes", a.len() + 1);
        assert_eq!(out, a);
    }

    #[test]
    fn zero_scores_fall_back_to_first_candidate() {
        let out = select_context(&["", "alpha beta", "gamma delta"], "zzz", 4);
        assert_eq!(out, "alph");
    }

    #[test]
    fn zero_scores_do_not_fill_the_budget() {
        let out = select_context(&["older tool output", "newer tool output"], "zzz", 5000);
        assert_eq!(out, "older tool output");
    }

    #[test]
    fn oversized_top_passage_falls_back_to_first_candidate() {
        let out = select_context(&["first passage", "retrieval retrieval"], "retrieval", 5);
        assert_eq!(out, "first");
    }

    #[test]
    fn empty_input_yields_empty_context() {
        let empty: [&str; 0] = [];
        assert_eq!(select_context(&empty, "anything", 100), "");
        assert_eq!(select_context(&["", ""], "anything", 100), "");
    }

    #[test]
    fn selection_is_idempotent() {
        let passages = ["feature stores serve features", "stores of data", "unrelated text"];
        let first = select_context(&passages, "feature stores", 5000);
        let second = select_context(&passages, "feature stores", 5000);
        assert_eq!(first, second);
        assert!(first.starts_with("feature stores serve features"));
    }

    #[test]
    fn short_words_are_not_terms() {
        assert_eq!(query_terms("Is ML on the GPU?"), vec!["the", "gpu"]);
    }
}

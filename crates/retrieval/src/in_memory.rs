//! In-memory vector index: keyword overlap over seeded passages.
//!
//! Stands in for a real embedding store in tests and offline runs. Every
//! passage matching the filter is a candidate; candidates are ranked by how
//! many distinct query words they contain, ties keep insertion order.

use async_trait::async_trait;
use ragwise_core::error::RetrievalError;
use ragwise_core::retrieval::{FilterSet, RetrievedPassage, VectorIndex};
use std::collections::HashSet;
use std::path::Path;

pub struct InMemoryIndex {
    passages: Vec<RetrievedPassage>,
}

fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(String::from)
        .collect()
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::with_passages(Vec::new())
    }

    pub fn with_passages(passages: Vec<RetrievedPassage>) -> Self {
        Self {
            passages,
        }
    }

    /// Load passages from a JSON array of [`RetrievedPassage`] objects.
    pub fn from_json_file(path: &Path) -> Result<Self, RetrievalError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::Unavailable(format!("Failed to read {}: {e}", path.display()))
        })?;
        let passages: Vec<RetrievedPassage> = serde_json::from_str(&content).map_err(|e| {
            RetrievalError::Unavailable(format!("Invalid passage file {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), count = passages.len(), "Seeded in-memory index");
        Ok(Self::with_passages(passages))
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&FilterSet>,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let query_words = words(query);
        let passages = &self.passages;

        let mut scored: Vec<(usize, &RetrievedPassage)> = passages
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.metadata)))
            .map(|p| {
                let text = words(&format!("{} {}", p.title, p.content));
                (query_words.intersection(&text).count(), p)
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored.into_iter().take(k).map(|(_, p)| p.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragwise_core::retrieval::{Department, PassageMetadata};

    fn passage(title: &str, content: &str, department: &str, year: i32) -> RetrievedPassage {
        RetrievedPassage {
            content: content.into(),
            source: format!("kb/{}.md", title.to_lowercase().replace(' ', "_")),
            title: title.into(),
            metadata: PassageMetadata {
                department: Some(department.into()),
                year: Some(year),
                ..Default::default()
            },
        }
    }

    fn seeded() -> InMemoryIndex {
        InMemoryIndex::with_passages(vec![
            passage("Kubernetes Rollouts", "Blue-green deployments on the platform", "Platform", 2022),
            passage("Transformer Notes", "Attention layers in transformer models", "AI Research", 2023),
            passage("Feature Stores", "Serving features for machine learning models", "ML Engineering", 2024),
        ])
    }

    #[tokio::test]
    async fn ranks_by_word_overlap() {
        let index = seeded();
        let results = index
            .similarity_search("transformer attention models", 2, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Transformer Notes");
        assert_eq!(results[1].title, "Feature Stores");
    }

    #[tokio::test]
    async fn filter_restricts_candidates() {
        let index = seeded();
        let filter = FilterSet {
            department: Some(Department::Platform),
            ..Default::default()
        };
        let results = index
            .similarity_search("transformer models", 3, Some(&filter))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Kubernetes Rollouts");

        let filter = FilterSet {
            year: Some(2019),
            ..Default::default()
        };
        assert!(index
            .similarity_search("anything", 3, Some(&filter))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"[{"content":"RAG pipelines","source":"kb/rag.md","title":"RAG","metadata":{"department":"AI Research","year":2023}}]"#,
        )
        .unwrap();

        let index = InMemoryIndex::from_json_file(&path).unwrap();
        assert_eq!(index.len(), 1);
        let hits = index.similarity_search("RAG pipelines", 3, None).await.unwrap();
        assert_eq!(hits[0].title, "RAG");
    }

    #[test]
    fn bad_json_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(&path, "{").unwrap();
        assert!(InMemoryIndex::from_json_file(&path).is_err());
    }
}

//! Suppression of repeated content chunks in a streamed turn.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Tracks what a stream has already emitted.
///
/// A chunk passes when its trimmed text is non-empty, differs from the
/// previous chunk and has a SHA-256 digest not seen before.
#[derive(Debug, Default)]
pub struct StreamDeduplicator {
    seen: HashSet<Vec<u8>>,
    last: Option<String>,
}

impl StreamDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The trimmed chunk to emit, or `None` to drop it.
    pub fn accept(&mut self, content: &str) -> Option<String> {
        let trimmed = content.trim();
        if trimmed.is_empty() || self.last.as_deref() == Some(trimmed) {
            return None;
        }

        let digest = Sha256::digest(trimmed.as_bytes()).to_vec();
        if !self.seen.insert(digest) {
            return None;
        }

        self.last = Some(trimmed.to_string());
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_chunk_emitted_once() {
        let mut dedup = StreamDeduplicator::new();
        assert_eq!(dedup.accept("Vector databases store embeddings."), Some("Vector databases store embeddings.".into()));
        assert_eq!(dedup.accept("Vector databases store embeddings."), None);
    }

    #[test]
    fn whitespace_variants_are_duplicates() {
        let mut dedup = StreamDeduplicator::new();
        assert!(dedup.accept("answer").is_some());
        assert!(dedup.accept("  answer\n").is_none());
    }

    #[test]
    fn earlier_chunk_is_suppressed_after_another() {
        let mut dedup = StreamDeduplicator::new();
        assert!(dedup.accept("one").is_some());
        assert!(dedup.accept("two").is_some());
        assert!(dedup.accept("one").is_none());
        assert!(dedup.accept("three").is_some());
    }

    #[test]
    fn empty_chunks_are_dropped() {
        let mut dedup = StreamDeduplicator::new();
        assert!(dedup.accept("").is_none());
        assert!(dedup.accept(" \t ").is_none());
        assert!(dedup.accept("first real chunk").is_some());
    }
}

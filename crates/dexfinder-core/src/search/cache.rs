//! Search result cache
//!
//! Keyed by normalized query. Each entry remembers the limit it was fetched
//! with so a later call asking for more results than were fetched is not
//! served a short list.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::entity::SearchResult;

#[derive(Debug, Clone)]
struct CachedSearch {
    results: Vec<SearchResult>,
    fetched_limit: usize,
}

impl CachedSearch {
    /// A short list means the match set was complete when fetched
    fn serves(&self, limit: usize) -> bool {
        limit <= self.fetched_limit || self.results.len() < self.fetched_limit
    }
}

/// Process-lifetime cache of enriched search results
#[derive(Debug, Default)]
pub struct SearchCache {
    entries: RwLock<HashMap<String, CachedSearch>>,
}

impl SearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the cached results truncated to `limit`, if the entry can serve it
    pub async fn get(&self, query: &str, limit: usize) -> Option<Vec<SearchResult>> {
        let entries = self.entries.read().await;
        let entry = entries.get(query)?;
        if !entry.serves(limit) {
            return None;
        }
        Some(entry.results.iter().take(limit).cloned().collect())
    }

    /// Store results fetched with `fetched_limit`, replacing any previous entry
    pub async fn put(&self, query: impl Into<String>, results: Vec<SearchResult>, fetched_limit: usize) {
        self.entries.write().await.insert(
            query.into(),
            CachedSearch {
                results,
                fetched_limit,
            },
        );
    }

    pub async fn contains(&self, query: &str) -> bool {
        self.entries.read().await.contains_key(query)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Cached queries, sorted
    pub async fn queries(&self) -> Vec<String> {
        let mut queries: Vec<String> = self.entries.read().await.keys().cloned().collect();
        queries.sort();
        queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: u32, name: &str) -> SearchResult {
        SearchResult {
            id,
            name: name.to_string(),
            image: String::new(),
            types: vec!["fire".to_string()],
        }
    }

    fn char_line() -> Vec<SearchResult> {
        vec![
            result(4, "charmander"),
            result(5, "charmeleon"),
            result(6, "charizard"),
        ]
    }

    #[tokio::test]
    async fn test_get_truncates_copy() {
        let cache = SearchCache::new();
        cache.put("char", char_line(), 3).await;

        let hit = cache.get("char", 2).await.unwrap();
        assert_eq!(hit.len(), 2);
        assert_eq!(hit[0].name, "charmander");

        // The stored entry is untouched by the truncated read
        assert_eq!(cache.get("char", 3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_larger_limit_misses_when_entry_was_full() {
        let cache = SearchCache::new();
        cache.put("char", char_line()[..2].to_vec(), 2).await;

        assert!(cache.get("char", 2).await.is_some());
        assert!(cache.get("char", 5).await.is_none());
    }

    #[tokio::test]
    async fn test_larger_limit_hits_when_match_set_was_complete() {
        let cache = SearchCache::new();
        cache.put("char", char_line(), 5).await;

        let hit = cache.get("char", 50).await.unwrap();
        assert_eq!(hit.len(), 3);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = SearchCache::new();
        cache.put("char", char_line(), 5).await;
        cache.put("pika", vec![result(25, "pikachu")], 5).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.queries().await, vec!["char", "pika"]);

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert!(!cache.contains("char").await);
    }
}

//! Keyword search over image sources kept in storage.

use crate::cache::LruCache;
use crate::storage::{Storage, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One searchable image as stored: `{ "url": ..., "keywords": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub keywords: Vec<String>,
}

/// Index of `source → url → keywords`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchIndex {
    sources: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from every storage value that is a JSON array of
    /// `{url, keywords}` entries. Other values are skipped.
    pub fn load(storage: &dyn Storage) -> StorageResult<Self> {
        let mut index = Self::new();
        for key in storage.keys()? {
            let Some(value) = storage.get(&key)? else {
                continue;
            };
            let Ok(serde_json::Value::Array(items)) = serde_json::from_str(&value) else {
                continue;
            };
            for item in items {
                match serde_json::from_value::<SearchHit>(item) {
                    Ok(hit) if !hit.url.is_empty() => index.insert(&key, hit),
                    Ok(_) => {}
                    Err(e) => log::warn!("Skipping malformed search entry in {}: {}", key, e),
                }
            }
        }
        log::debug!("Loaded search index with {} entries", index.len());
        Ok(index)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, source: &str, hit: SearchHit) {
        self.sources
            .entry(source.to_string())
            .or_default()
            .insert(hit.url, hit.keywords);
    }

    /// Case-insensitive search. An entry matches when one of its keywords
    /// contains the query or is contained in it.
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        let query = query.to_lowercase();
        self.sources
            .values()
            .flat_map(|urls| urls.iter())
            .filter(|(_, keywords)| {
                keywords.iter().any(|keyword| {
                    let keyword = keyword.to_lowercase();
                    keyword.contains(&query) || query.contains(&keyword)
                })
            })
            .map(|(url, keywords)| SearchHit {
                url: url.clone(),
                keywords: keywords.clone(),
            })
            .collect()
    }

    /// Number of indexed urls.
    pub fn len(&self) -> usize {
        self.sources.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Search with results memoized per query.
#[derive(Debug)]
pub struct MemoizedSearch {
    index: SearchIndex,
    cache: LruCache<String, Arc<Vec<SearchHit>>>,
    page_size: usize,
}

impl MemoizedSearch {
    pub fn new(index: SearchIndex, capacity: usize, page_size: usize) -> Self {
        Self {
            index,
            cache: LruCache::new(capacity),
            page_size: page_size.max(1),
        }
    }

    /// Results for a query. Surrounding whitespace is ignored and a blank
    /// query has no results.
    pub fn search(&mut self, query: &str) -> Arc<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Arc::new(Vec::new());
        }
        if let Some(hits) = self.cache.get(&query.to_string()) {
            return Arc::clone(hits);
        }
        let hits = Arc::new(self.index.search(query));
        self.cache.put(query.to_string(), Arc::clone(&hits));
        hits
    }

    /// One page of results, `page` counting from 1.
    pub fn page(&mut self, query: &str, page: usize) -> Vec<SearchHit> {
        let hits = self.search(query);
        paginate(&hits, page, self.page_size).to_vec()
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Number of memoized queries.
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}

/// Slice out page `page` (from 1) of `per_page` items.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if page == 0 || start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn storage() -> MemoryStorage {
        MemoryStorage::with_entries([
            (
                "forgotten-adventures",
                r#"[
                    {"url": "fa/goblin.webp", "keywords": ["Goblin", "monster"]},
                    {"url": "fa/tree.webp", "keywords": ["tree", "forest"]}
                ]"#,
            ),
            ("notes", "not json"),
            ("Blackletter.ttf", r#"{"data": [0], "name": "Blackletter"}"#),
        ])
    }

    #[test]
    fn test_load_skips_non_index_values() {
        let index = SearchIndex::load(&storage()).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_search_is_bidirectional_and_case_insensitive() {
        let index = SearchIndex::load(&storage()).unwrap();

        let hits = index.search("GOB");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "fa/goblin.webp");

        // Query containing a keyword also matches
        let hits = index.search("dark forest path");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "fa/tree.webp");

        assert!(index.search("dragon").is_empty());
    }

    #[test]
    fn test_memoized_search_caches() {
        let index = SearchIndex::load(&storage()).unwrap();
        let mut search = MemoizedSearch::new(index, 800, 20);
        let first = search.search(" tree ");
        let second = search.search("tree");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(search.cached_queries(), 1);
        assert!(search.search("   ").is_empty());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (0..45).collect();
        assert_eq!(paginate(&items, 1, 20).len(), 20);
        assert_eq!(paginate(&items, 3, 20), &items[40..45]);
        assert!(paginate(&items, 4, 20).is_empty());
        assert!(paginate(&items, 0, 20).is_empty());
    }
}

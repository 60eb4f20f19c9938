//! In-memory cache store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use lexis_core::{validate_cache_key, LexisResult, NamespaceBlock, StorageError};

use super::traits::{CacheStats, CacheStore};

/// Cache store backed by a locked `HashMap`.
///
/// Entries never expire on their own; [`InMemoryCacheStore::clear`] empties
/// the store, which looks to the provider like a cache-wide eviction.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, NamespaceBlock>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blocks.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a block is stored under `key`, without touching statistics.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    /// Drop every entry.
    pub fn clear(&self) -> LexisResult<()> {
        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .clear();
        Ok(())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> LexisResult<Option<NamespaceBlock>> {
        validate_cache_key(key)?;

        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        let found = entries.get(key).cloned();

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }

        Ok(found)
    }

    async fn set(&self, key: &str, block: &NamespaceBlock) -> LexisResult<()> {
        validate_cache_key(key)?;

        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .insert(key.to_string(), block.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> LexisResult<()> {
        validate_cache_key(key)?;

        self.entries
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .remove(key);
        Ok(())
    }

    async fn stats(&self) -> LexisResult<CacheStats> {
        let entry_count = self
            .entries
            .read()
            .map_err(|_| StorageError::LockPoisoned)?
            .len() as u64;

        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexis_core::{CacheKey, LexisError};

    fn block(pairs: &[(&str, &str)]) -> NamespaceBlock {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = InMemoryCacheStore::new();
        let key = CacheKey::derive("ui", "en");

        store
            .set(key.as_str(), &block(&[("save", "Save")]))
            .await
            .unwrap();

        let cached = store.get(key.as_str()).await.unwrap().unwrap();
        assert_eq!(cached.get("save"), Some("Save"));
    }

    #[tokio::test]
    async fn test_set_replaces_whole_block() {
        let store = InMemoryCacheStore::new();
        let key = CacheKey::derive("ui", "en");

        store
            .set(key.as_str(), &block(&[("save", "Save"), ("cancel", "Cancel")]))
            .await
            .unwrap();
        store
            .set(key.as_str(), &block(&[("save", "Store")]))
            .await
            .unwrap();

        let cached = store.get(key.as_str()).await.unwrap().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached.get("cancel"), None);
    }

    #[tokio::test]
    async fn test_delete_absent_key_succeeds() {
        let store = InMemoryCacheStore::new();
        store.delete("__lexis_ui.en").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let store = InMemoryCacheStore::new();

        let err = store.get("ui:en").await.unwrap_err();
        assert!(err.is_invalid_cache_key());

        let err = store.set("", &NamespaceBlock::new()).await.unwrap_err();
        assert!(matches!(
            err,
            LexisError::Storage(StorageError::InvalidCacheKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let store = InMemoryCacheStore::new();
        let key = CacheKey::derive("ui", "en");

        assert!(store.get(key.as_str()).await.unwrap().is_none());
        store.set(key.as_str(), &NamespaceBlock::new()).await.unwrap();
        assert!(store.get(key.as_str()).await.unwrap().is_some());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let store = InMemoryCacheStore::new();
        store
            .set(CacheKey::derive("ui", "en").as_str(), &NamespaceBlock::new())
            .await
            .unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
    }
}

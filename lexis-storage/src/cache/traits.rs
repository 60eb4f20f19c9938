//! Cache store trait and statistics.

use std::sync::Arc;

use async_trait::async_trait;
use lexis_core::{LexisResult, NamespaceBlock};

/// Shared key-value cache holding namespace blocks.
///
/// Implementations must be thread-safe. Each call is individually atomic;
/// no ordering is guaranteed across calls.
///
/// # Key Rules
///
/// Stores must reject keys that fail [`lexis_core::validate_cache_key`]
/// with `StorageError::InvalidCacheKey` instead of silently rewriting them.
/// Keys produced by [`lexis_core::CacheKey::derive`] always pass.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the block stored under `key`, or `None` on a miss.
    async fn get(&self, key: &str) -> LexisResult<Option<NamespaceBlock>>;

    /// Store a whole block under `key`, replacing any previous entry.
    async fn set(&self, key: &str, block: &NamespaceBlock) -> LexisResult<()>;

    /// Remove `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> LexisResult<()>;

    /// Get cache statistics.
    async fn stats(&self) -> LexisResult<CacheStats>;
}

#[async_trait]
impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    async fn get(&self, key: &str) -> LexisResult<Option<NamespaceBlock>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, block: &NamespaceBlock) -> LexisResult<()> {
        (**self).set(key, block).await
    }

    async fn delete(&self, key: &str) -> LexisResult<()> {
        (**self).delete(key).await
    }

    async fn stats(&self) -> LexisResult<CacheStats> {
        (**self).stats().await
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}

//! Content provider: tiered reads with locale fallback.
//!
//! # Caching Levels
//!
//! 1. L1 - in-process map owned by the provider instance
//! 2. L2 - shared [`CacheStore`]
//! 3. L3 - [`PersistenceLayer`]
//!
//! Reads stop at the first tier that knows the block. Every tier holds whole
//! namespace blocks; a write drops the whole block from L1 and L2 before the
//! durable upsert, so the next read pulls a complete fresh snapshot.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lexis_core::{
    CacheKey, ContentKey, LexisConfig, LexisResult, NamespaceBlock, StorageError,
};

use crate::cache::CacheStore;
use crate::persistence::PersistenceLayer;

/// A block held in the in-process tier.
#[derive(Debug, Clone)]
struct LocalBlock {
    block: Arc<NamespaceBlock>,
    loaded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StatsCounters {
    local_hits: AtomicU64,
    shared_hits: AtomicU64,
    store_loads: AtomicU64,
    fallbacks: AtomicU64,
    writes: AtomicU64,
}

/// Snapshot of provider activity since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderStats {
    /// Block lookups answered by the in-process tier.
    pub local_hits: u64,
    /// Blocks loaded from the shared cache store.
    pub shared_hits: u64,
    /// Blocks loaded from the persistence layer.
    pub store_loads: u64,
    /// Lookups retried in the fallback locale.
    pub fallbacks: u64,
    /// Successful writes.
    pub writes: u64,
}

impl ProviderStats {
    /// Share of block lookups served without touching persistence.
    pub fn hit_rate(&self) -> f64 {
        let total = self.local_hits + self.shared_hits + self.store_loads;
        if total == 0 {
            0.0
        } else {
            (self.local_hits + self.shared_hits) as f64 / total as f64
        }
    }
}

/// Three-tier read-through provider for localized content.
///
/// # Type Parameters
///
/// - `C`: the shared cache store (L2)
/// - `P`: the persistence layer (L3)
///
/// # Example
///
/// ```ignore
/// let provider = ContentProvider::new(
///     Arc::new(InMemoryCacheStore::new()),
///     Arc::new(config.connect()?),
///     LexisConfig::new().with_fallback("en"),
/// );
///
/// let label = provider.get_content("ui", "fr", "save").await?;
/// provider.save_content("ui", "fr", "save", "Enregistrer").await?;
/// ```
pub struct ContentProvider<C, P>
where
    C: CacheStore,
    P: PersistenceLayer,
{
    cache: Arc<C>,
    persistence: Arc<P>,
    config: LexisConfig,
    /// In-process tier, keyed like the shared cache.
    loaded: DashMap<CacheKey, LocalBlock>,
    stats: StatsCounters,
}

impl<C, P> ContentProvider<C, P>
where
    C: CacheStore,
    P: PersistenceLayer,
{
    /// Create a new provider with an empty in-process tier.
    pub fn new(cache: Arc<C>, persistence: Arc<P>, config: LexisConfig) -> Self {
        Self {
            cache,
            persistence,
            config,
            loaded: DashMap::new(),
            stats: StatsCounters::default(),
        }
    }

    /// Get the provider configuration.
    pub fn config(&self) -> &LexisConfig {
        &self.config
    }

    /// Get a reference to the shared cache store.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Get a reference to the persistence layer.
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Key addressing the (namespace, locale) block in every cache tier.
    pub fn cache_key(namespace: &str, locale: &str) -> CacheKey {
        CacheKey::derive(namespace, locale)
    }

    /// Resolve the content for (namespace, locale, name).
    ///
    /// Tries the requested locale, then the configured fallback locale. Each
    /// attempt walks L1 → L2 → L3 for its block. Content missing in both
    /// resolves to the empty string; only collaborator failures are errors.
    pub async fn get_content(
        &self,
        namespace: &str,
        locale: &str,
        name: &str,
    ) -> LexisResult<String> {
        let fallback = self.config.fallback.as_str();
        let attempts = std::iter::once(locale).chain((locale != fallback).then_some(fallback));

        for (attempt, current) in attempts.enumerate() {
            if attempt > 0 {
                self.stats.fallbacks.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(namespace, locale, fallback, name, "Falling back to default locale");
            }

            let block = self.local_block(namespace, current).await?;
            if let Some(content) = block.get(name) {
                return Ok(content.to_string());
            }
        }

        tracing::trace!(namespace, locale, name, "Content missing in every locale");
        Ok(String::new())
    }

    /// [`get_content`](Self::get_content) addressed by a [`ContentKey`].
    pub async fn get(&self, key: &ContentKey) -> LexisResult<String> {
        self.get_content(&key.namespace, &key.locale, &key.name).await
    }

    /// Store content durably and drop its block from L1 and L2.
    ///
    /// The caches are cleared before the upsert and again after it succeeds.
    /// If the upsert fails the error is returned and the block stays cold, so
    /// no tier ever reports content that was not stored.
    pub async fn save_content(
        &self,
        namespace: &str,
        locale: &str,
        name: &str,
        content: &str,
    ) -> LexisResult<()> {
        let key = Self::cache_key(namespace, locale);

        self.loaded.remove(&key);
        self.bounded("cache delete", self.cache.delete(key.as_str()))
            .await?;

        self.bounded(
            "persistence write",
            self.persistence
                .save_content(namespace, name, locale, content),
        )
        .await?;

        // A reader that loaded before the upsert landed may have put the old
        // block back into either tier.
        self.loaded.remove(&key);
        self.bounded("cache delete", self.cache.delete(key.as_str()))
            .await?;

        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        tracing::info!(namespace, locale, name, key = %key, "Content saved");
        Ok(())
    }

    /// [`save_content`](Self::save_content) addressed by a [`ContentKey`].
    pub async fn save(&self, key: &ContentKey, content: &str) -> LexisResult<()> {
        self.save_content(&key.namespace, &key.locale, &key.name, content)
            .await
    }

    /// Load a whole block from the shared cache, or from persistence on a
    /// cache miss.
    ///
    /// A block read from persistence is written back to the cache store on a
    /// best-effort basis: a failed cache write is logged and the block is
    /// still returned. L2 and L3 data are never merged.
    pub async fn load_namespace_from_cache(
        &self,
        namespace: &str,
        locale: &str,
    ) -> LexisResult<NamespaceBlock> {
        let key = Self::cache_key(namespace, locale);

        if let Some(block) = self
            .bounded("cache get", self.cache.get(key.as_str()))
            .await?
        {
            self.stats.shared_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(namespace, locale, key = %key, "Shared cache hit");
            return Ok(block);
        }

        let block = self
            .bounded(
                "persistence read",
                self.persistence.get_namespace_content(namespace, locale),
            )
            .await?;
        self.stats.store_loads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            namespace,
            locale,
            key = %key,
            entries = block.len(),
            "Loaded block from persistence"
        );

        if let Err(e) = self
            .bounded("cache set", self.cache.set(key.as_str(), &block))
            .await
        {
            tracing::warn!(namespace, locale, key = %key, error = %e, "Failed to populate shared cache");
        }

        Ok(block)
    }

    /// Drop one block from L1 and L2 without writing anything.
    ///
    /// Useful when persistence was changed behind the provider's back.
    pub async fn invalidate(&self, namespace: &str, locale: &str) -> LexisResult<()> {
        let key = Self::cache_key(namespace, locale);
        self.loaded.remove(&key);
        self.bounded("cache delete", self.cache.delete(key.as_str()))
            .await
    }

    /// Drop every block held by this provider's in-process tier.
    pub fn clear_local(&self) {
        self.loaded.clear();
    }

    /// Number of blocks currently held in the in-process tier.
    pub fn local_len(&self) -> usize {
        self.loaded.len()
    }

    /// Snapshot of the activity counters.
    pub fn stats(&self) -> ProviderStats {
        ProviderStats {
            local_hits: self.stats.local_hits.load(Ordering::Relaxed),
            shared_hits: self.stats.shared_hits.load(Ordering::Relaxed),
            store_loads: self.stats.store_loads.load(Ordering::Relaxed),
            fallbacks: self.stats.fallbacks.load(Ordering::Relaxed),
            writes: self.stats.writes.load(Ordering::Relaxed),
        }
    }

    /// The block for (namespace, locale) from L1, loading it on a miss.
    ///
    /// A present block is used as-is even when it lacks the requested name;
    /// only an absent or expired block triggers a load.
    async fn local_block(&self, namespace: &str, locale: &str) -> LexisResult<Arc<NamespaceBlock>> {
        let key = Self::cache_key(namespace, locale);

        if let Some(entry) = self.loaded.get(&key) {
            if !self.is_expired(&entry) {
                self.stats.local_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(&entry.block));
            }
        }

        let block = Arc::new(self.load_namespace_from_cache(namespace, locale).await?);
        self.loaded.insert(
            key,
            LocalBlock {
                block: Arc::clone(&block),
                loaded_at: Utc::now(),
            },
        );
        Ok(block)
    }

    fn is_expired(&self, entry: &LocalBlock) -> bool {
        let Some(ttl) = self.config.local_ttl else {
            return false;
        };
        let age = Utc::now()
            .signed_duration_since(entry.loaded_at)
            .to_std()
            .unwrap_or_default();
        age >= ttl
    }

    /// Run a collaborator call under the configured timeout.
    async fn bounded<T, F>(&self, operation: &str, call: F) -> LexisResult<T>
    where
        F: Future<Output = LexisResult<T>>,
    {
        match self.config.collaborator_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                tracing::warn!(operation, ?limit, "Collaborator call timed out");
                StorageError::Timeout {
                    operation: operation.to_string(),
                    limit,
                }
            })?,
            None => call.await,
        }
    }
}

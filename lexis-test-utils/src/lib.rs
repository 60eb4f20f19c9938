//! Lexis Test Utilities
//!
//! Centralized test infrastructure for the Lexis workspace:
//! - Instrumented collaborators that count calls and inject failures
//! - Proptest generators for keys, locales and content
//! - Test fixtures for common scenarios
//! - Custom assertions for Lexis-specific errors

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use lexis_core::{
    CacheKey, ConfigError, ContentKey, LexisConfig, LexisError, LexisResult, NamespaceBlock,
    StorageError,
};
pub use lexis_storage::{
    CacheStats, CacheStore, ContentProvider, InMemoryCacheStore, InMemoryPersistence,
    PersistenceLayer,
};

// ============================================================================
// INSTRUMENTED CACHE STORE
// ============================================================================

/// In-memory cache store that counts calls and can be told to misbehave.
#[derive(Debug, Default)]
pub struct CountingCacheStore {
    inner: InMemoryCacheStore,
    gets: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    fail_sets: AtomicBool,
    reject_keys: AtomicBool,
    delay: Option<Duration>,
}

impl CountingCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering any call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every `set` fail with a cache error.
    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    /// Make every call reject its key, like a store with stricter key rules.
    pub fn reject_keys(&self, reject: bool) {
        self.reject_keys.store(reject, Ordering::SeqCst);
    }

    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> u64 {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::SeqCst)
    }

    /// The underlying store, for direct inspection.
    pub fn inner(&self) -> &InMemoryCacheStore {
        &self.inner
    }

    async fn enter(&self, key: &str) -> LexisResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_keys.load(Ordering::SeqCst) {
            return Err(StorageError::InvalidCacheKey {
                key: key.to_string(),
                reason: "rejected by test store".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for CountingCacheStore {
    async fn get(&self, key: &str) -> LexisResult<Option<NamespaceBlock>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.enter(key).await?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, block: &NamespaceBlock) -> LexisResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.enter(key).await?;
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(StorageError::CacheFailed {
                operation: "set".to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.inner.set(key, block).await
    }

    async fn delete(&self, key: &str) -> LexisResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.enter(key).await?;
        self.inner.delete(key).await
    }

    async fn stats(&self) -> LexisResult<CacheStats> {
        self.inner.stats().await
    }
}

// ============================================================================
// INSTRUMENTED PERSISTENCE
// ============================================================================

/// In-memory persistence layer that counts calls and can fail writes.
#[derive(Debug, Default)]
pub struct CountingPersistence {
    inner: InMemoryPersistence,
    reads: AtomicU64,
    writes: AtomicU64,
    fail_writes: AtomicBool,
    read_delay: Option<Duration>,
    write_delay: Option<Duration>,
}

impl CountingPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows given as (namespace, locale, name, content).
    pub fn seeded(rows: &[(&str, &str, &str, &str)]) -> Self {
        let inner = rows
            .iter()
            .fold(InMemoryPersistence::new(), |p, (namespace, locale, name, content)| {
                p.with_entry(namespace, locale, name, content)
            });
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Sleep this long between taking a read snapshot and returning it.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Sleep this long before applying an upsert.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Make every upsert fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// The underlying driver, for direct inspection.
    pub fn inner(&self) -> &InMemoryPersistence {
        &self.inner
    }
}

#[async_trait]
impl PersistenceLayer for CountingPersistence {
    async fn get_namespace_content(
        &self,
        namespace: &str,
        locale: &str,
    ) -> LexisResult<NamespaceBlock> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let snapshot = self.inner.get_namespace_content(namespace, locale).await;
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        snapshot
    }

    async fn save_content(
        &self,
        namespace: &str,
        name: &str,
        locale: &str,
        content: &str,
    ) -> LexisResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::PersistenceFailed {
                operation: "upsert".to_string(),
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.inner.save_content(namespace, name, locale, content).await
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating Lexis inputs.

    use super::*;
    use proptest::prelude::*;

    /// Namespace that stays in the readable cache-key form.
    pub fn arb_plain_namespace() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,11}"
    }

    /// Any namespace, including dots, reserved characters and unicode.
    pub fn arb_namespace() -> impl Strategy<Value = String> {
        prop_oneof![
            3 => arb_plain_namespace(),
            1 => "[a-z.:/@{}()]{1,10}",
            1 => "\\PC{0,40}",
        ]
    }

    /// Locale tags in the usual shapes, plus the empty locale.
    pub fn arb_locale() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[a-z]{2}",
            "[a-z]{2}[_-][A-Z]{2}",
            "[a-z]{2}\\.[A-Z]{2}",
        ]
    }

    /// Content name within a namespace.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_.]{0,15}"
    }

    /// Content string, including empty content.
    pub fn arb_content() -> impl Strategy<Value = String> {
        "\\PC{0,32}"
    }

    /// Full content key.
    pub fn arb_content_key() -> impl Strategy<Value = ContentKey> {
        (arb_namespace(), arb_locale(), arb_name())
            .prop_map(|(namespace, locale, name)| ContentKey::new(namespace, locale, name))
    }

    /// Two different locales: (requested, fallback).
    pub fn arb_distinct_locales() -> impl Strategy<Value = (String, String)> {
        (arb_locale(), arb_locale()).prop_filter("locales must differ", |(a, b)| a != b)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-wired providers for common scenarios.

    use super::*;

    /// Provider over instrumented collaborators.
    pub type TestProvider = ContentProvider<CountingCacheStore, CountingPersistence>;

    /// A provider plus handles on its collaborators.
    pub struct Harness {
        pub provider: TestProvider,
        pub cache: Arc<CountingCacheStore>,
        pub persistence: Arc<CountingPersistence>,
    }

    impl Harness {
        /// Build a harness over the given collaborators.
        pub fn new(
            cache: CountingCacheStore,
            persistence: CountingPersistence,
            config: LexisConfig,
        ) -> Self {
            let cache = Arc::new(cache);
            let persistence = Arc::new(persistence);
            let provider =
                ContentProvider::new(Arc::clone(&cache), Arc::clone(&persistence), config);
            Self {
                provider,
                cache,
                persistence,
            }
        }

        /// Build a harness with seeded persistence and a fallback locale.
        pub fn seeded(fallback: &str, rows: &[(&str, &str, &str, &str)]) -> Self {
            Self::new(
                CountingCacheStore::new(),
                CountingPersistence::seeded(rows),
                LexisConfig::new().with_fallback(fallback),
            )
        }

        /// A second provider sharing this harness' cache and persistence,
        /// like another process on the same cluster.
        pub fn sibling(&self) -> TestProvider {
            ContentProvider::new(
                Arc::clone(&self.cache),
                Arc::clone(&self.persistence),
                self.provider.config().clone(),
            )
        }
    }

    /// The "ui" scenario: fallback "en" and English "save" only. Nothing is
    /// stored for French, which reads as an empty block.
    pub fn ui_harness() -> Harness {
        Harness::seeded("en", &[("ui", "en", "save", "Save")])
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for Lexis-specific validation.

    use super::*;

    /// Assert that a LexisResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &LexisResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a LexisResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &LexisResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert that a LexisResult is a Storage error.
    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &LexisResult<T>) {
        match result {
            Err(LexisError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }

    /// Assert that a LexisResult is an InvalidCacheKey error.
    #[track_caller]
    pub fn assert_invalid_cache_key<T: std::fmt::Debug>(result: &LexisResult<T>) {
        match result {
            Err(LexisError::Storage(StorageError::InvalidCacheKey { .. })) => {}
            other => panic!("Expected InvalidCacheKey error, got: {:?}", other),
        }
    }

    /// Assert that a LexisResult is a Timeout for the named operation.
    #[track_caller]
    pub fn assert_timeout<T: std::fmt::Debug>(result: &LexisResult<T>, operation: &str) {
        match result {
            Err(LexisError::Storage(StorageError::Timeout { operation: op, .. })) => {
                assert_eq!(op, operation, "Wrong operation in Timeout error");
            }
            other => panic!("Expected Timeout for {}, got: {:?}", operation, other),
        }
    }

    /// Assert that a LexisResult is a PersistenceFailed error.
    #[track_caller]
    pub fn assert_persistence_failed<T: std::fmt::Debug>(result: &LexisResult<T>) {
        match result {
            Err(LexisError::Storage(StorageError::PersistenceFailed { .. })) => {}
            other => panic!("Expected PersistenceFailed error, got: {:?}", other),
        }
    }
}

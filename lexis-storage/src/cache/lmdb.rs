//! Shared cache tier on a local LMDB file.
//!
//! Every process on a host that opens the same directory sees the same
//! blocks. Each block is stored as one JSON value, so `set` always replaces
//! an entry whole and a reader never observes half a block.
//!
//! `get` and `stats` run in read transactions; `set`, `delete` and `clear`
//! each commit their own write transaction. Hit and miss counts are kept per
//! process, not in the file.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use lexis_core::{validate_cache_key, LexisError, LexisResult, NamespaceBlock, StorageError};

use super::traits::{CacheStats, CacheStore};

/// Failure inside the LMDB store, before it is folded into [`LexisError`].
#[derive(Debug, thiserror::Error)]
pub enum LmdbCacheError {
    #[error("cannot open cache environment: {0}")]
    Open(String),

    #[error("cache transaction aborted: {0}")]
    Txn(String),

    #[error("cannot encode block: {0}")]
    Encode(String),

    #[error("stored block is corrupt: {0}")]
    Decode(String),

    #[error("cache directory: {0}")]
    Io(#[from] std::io::Error),
}

impl LmdbCacheError {
    fn txn(e: heed::Error) -> Self {
        Self::Txn(e.to_string())
    }

    fn operation(&self) -> &'static str {
        match self {
            Self::Open(_) | Self::Io(_) => "open",
            Self::Txn(_) => "transaction",
            Self::Encode(_) => "encode",
            Self::Decode(_) => "decode",
        }
    }
}

impl From<LmdbCacheError> for LexisError {
    fn from(e: LmdbCacheError) -> Self {
        LexisError::Storage(StorageError::CacheFailed {
            operation: e.operation().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Namespace blocks in a memory-mapped LMDB file, keyed by derived cache key.
///
/// ```ignore
/// let store = LmdbCacheStore::new("/var/cache/lexis", 64)?;
/// let key = CacheKey::derive("ui", "en");
/// store.set(key.as_str(), &block).await?;
/// assert_eq!(store.get(key.as_str()).await?, Some(block));
/// ```
pub struct LmdbCacheStore {
    env: Env,
    /// Unnamed database: cache key bytes to JSON-encoded block.
    db: Database<Bytes, Bytes>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LmdbCacheStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// `max_size_mb` caps the memory map; writes past it fail with
    /// [`LmdbCacheError::Txn`].
    pub fn new<P: AsRef<Path>>(dir: P, max_size_mb: usize) -> Result<Self, LmdbCacheError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        // SAFETY: LMDB forbids opening one directory twice per process; each
        // store owns its directory.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(dir)
        }
        .map_err(|e| LmdbCacheError::Open(e.to_string()))?;

        let mut wtxn = env.write_txn().map_err(LmdbCacheError::txn)?;
        let db = env
            .create_database::<Bytes, Bytes>(&mut wtxn, None)
            .map_err(|e| LmdbCacheError::Open(e.to_string()))?;
        wtxn.commit().map_err(LmdbCacheError::txn)?;

        Ok(Self {
            env,
            db,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Remove every entry, returning how many were dropped.
    pub fn clear(&self) -> Result<u64, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbCacheError::txn)?;
        let count = self.db.len(&wtxn).map_err(LmdbCacheError::txn)?;
        self.db.clear(&mut wtxn).map_err(LmdbCacheError::txn)?;
        wtxn.commit().map_err(LmdbCacheError::txn)?;
        Ok(count)
    }

    fn read(&self, key: &str) -> Result<Option<NamespaceBlock>, LmdbCacheError> {
        let rtxn = self.env.read_txn().map_err(LmdbCacheError::txn)?;
        self.db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbCacheError::txn)?
            .map(|bytes| {
                serde_json::from_slice::<NamespaceBlock>(bytes).map_err(|e| LmdbCacheError::Decode(e.to_string()))
            })
            .transpose()
    }

    fn write(&self, key: &str, block: &NamespaceBlock) -> Result<(), LmdbCacheError> {
        let value =
            serde_json::to_vec(block).map_err(|e| LmdbCacheError::Encode(e.to_string()))?;
        let mut wtxn = self.env.write_txn().map_err(LmdbCacheError::txn)?;
        self.db
            .put(&mut wtxn, key.as_bytes(), &value)
            .map_err(LmdbCacheError::txn)?;
        wtxn.commit().map_err(LmdbCacheError::txn)
    }

    fn remove(&self, key: &str) -> Result<bool, LmdbCacheError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbCacheError::txn)?;
        let deleted = self
            .db
            .delete(&mut wtxn, key.as_bytes())
            .map_err(LmdbCacheError::txn)?;
        wtxn.commit().map_err(LmdbCacheError::txn)?;
        Ok(deleted)
    }

    fn entry_count(&self) -> Result<u64, LmdbCacheError> {
        let rtxn = self.env.read_txn().map_err(LmdbCacheError::txn)?;
        self.db.len(&rtxn).map_err(LmdbCacheError::txn)
    }
}

#[async_trait]
impl CacheStore for LmdbCacheStore {
    async fn get(&self, key: &str) -> LexisResult<Option<NamespaceBlock>> {
        validate_cache_key(key)?;

        match self.read(key) {
            Ok(Some(block)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(block))
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Err(e.into())
            }
        }
    }

    async fn set(&self, key: &str, block: &NamespaceBlock) -> LexisResult<()> {
        validate_cache_key(key)?;
        self.write(key, block)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> LexisResult<()> {
        validate_cache_key(key)?;
        let deleted = self.remove(key)?;
        tracing::trace!(key, deleted, "LMDB cache delete");
        Ok(())
    }

    async fn stats(&self) -> LexisResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entry_count()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexis_core::CacheKey;
    use tempfile::TempDir;

    fn create_test_store() -> (LmdbCacheStore, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let store = LmdbCacheStore::new(temp_dir.path(), 10).expect("store creation should succeed");
        (store, temp_dir)
    }

    fn block(pairs: &[(&str, &str)]) -> NamespaceBlock {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_put_and_get_block() {
        let (store, _dir) = create_test_store();
        let key = CacheKey::derive("ui", "en");
        let original = block(&[("save", "Save"), ("cancel", "Cancel")]);

        store.set(key.as_str(), &original).await.unwrap();
        let cached = store.get(key.as_str()).await.unwrap();

        assert_eq!(cached, Some(original));
    }

    #[tokio::test]
    async fn test_empty_block_is_a_hit() {
        let (store, _dir) = create_test_store();
        let key = CacheKey::derive("ui", "fr");

        store.set(key.as_str(), &NamespaceBlock::new()).await.unwrap();
        let cached = store.get(key.as_str()).await.unwrap();

        assert_eq!(cached, Some(NamespaceBlock::new()));
        assert_eq!(store.stats().await.unwrap().hits, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let (store, _dir) = create_test_store();
        let key = CacheKey::derive("ui", "en");

        store.set(key.as_str(), &block(&[("save", "Save")])).await.unwrap();
        store.delete(key.as_str()).await.unwrap();

        assert_eq!(store.get(key.as_str()).await.unwrap(), None);
        // Deleting again is not an error.
        store.delete(key.as_str()).await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let (store, _dir) = create_test_store();
        let err = store.get("{bad}").await.unwrap_err();
        assert!(err.is_invalid_cache_key());
    }

    #[tokio::test]
    async fn test_stats_and_clear() {
        let (store, _dir) = create_test_store();

        for locale in ["en", "fr", "de"] {
            let key = CacheKey::derive("ui", locale);
            store.set(key.as_str(), &NamespaceBlock::new()).await.unwrap();
        }
        let _ = store.get(CacheKey::derive("ui", "es").as_str()).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.entry_count, 3);
        assert_eq!(stats.misses, 1);

        assert_eq!(store.clear().unwrap(), 3);
        assert_eq!(store.stats().await.unwrap().entry_count, 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_decode_failure() {
        let (store, _dir) = create_test_store();
        let key = CacheKey::derive("ui", "en");

        let mut wtxn = store.env.write_txn().unwrap();
        store
            .db
            .put(&mut wtxn, key.as_str().as_bytes(), &b"not json"[..])
            .unwrap();
        wtxn.commit().unwrap();

        let err = store.get(key.as_str()).await.unwrap_err();
        assert!(matches!(
            err,
            LexisError::Storage(StorageError::CacheFailed { ref operation, .. }) if operation == "decode"
        ));
        assert_eq!(store.stats().await.unwrap().misses, 1);
    }

    #[test]
    fn test_open_on_regular_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let err = match LmdbCacheStore::new(file.path(), 1) {
            Ok(_) => panic!("opening a regular file as a cache directory should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, LmdbCacheError::Io(_)));

        let err = LexisError::from(err);
        assert!(matches!(
            err,
            LexisError::Storage(StorageError::CacheFailed { ref operation, .. }) if operation == "open"
        ));
    }
}

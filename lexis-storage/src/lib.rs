//! Lexis Storage - Tiered Content Provider
//!
//! Read path: in-process map (L1) → shared cache store (L2) → persistence
//! layer (L3). Writes clear L1 and L2 for the whole block before the durable
//! upsert, so caches only ever hold whole snapshots pulled from persistence.
//!
//! The two collaborators sit behind narrow traits:
//! - [`CacheStore`]: get/set/delete of a namespace block by key
//! - [`PersistenceLayer`]: bulk read of a block, upsert of one string

pub mod cache;
pub mod persistence;
pub mod provider;

pub use cache::{CacheStats, CacheStore, InMemoryCacheStore, LmdbCacheError, LmdbCacheStore};
pub use persistence::{
    InMemoryPersistence, PersistenceLayer, PgExecutor, SqlConfig, SqlDialect, SqlExecutor,
    SqlPersistence,
};
pub use provider::{ContentProvider, ProviderStats};

pub use lexis_core::{
    CacheKey, ConfigError, ContentKey, LexisConfig, LexisError, LexisResult, NamespaceBlock,
    StorageError,
};

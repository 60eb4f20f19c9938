//! Shared cache tier (L2).
//!
//! A cache store holds whole namespace blocks under derived keys. The
//! provider never patches an entry: it sets a freshly loaded block or
//! deletes the key. Eviction policy belongs to the store and is invisible to
//! the provider, which simply reloads on the next miss.
//!
//! Two stores ship with the crate:
//! - [`InMemoryCacheStore`]: process-wide map, useful for tests and
//!   single-node deployments
//! - [`LmdbCacheStore`]: memory-mapped LMDB environment shared by every
//!   process on the host

pub mod lmdb;
pub mod memory;
pub mod traits;

pub use lmdb::{LmdbCacheError, LmdbCacheStore};
pub use memory::InMemoryCacheStore;
pub use traits::{CacheStats, CacheStore};

//! Durable tier (L3).
//!
//! The persistence layer is the source of truth. It answers bulk reads of a
//! whole namespace block and idempotent upserts of a single string.
//!
//! - [`InMemoryPersistence`]: map-backed driver for tests and embedding
//! - [`SqlPersistence`]: SQL driver over any [`SqlExecutor`], with the
//!   upsert clause chosen once from a closed [`SqlDialect`]
//! - [`PgExecutor`]: PostgreSQL executor on a deadpool connection pool

pub mod memory;
pub mod postgres;
pub mod sql;
pub mod traits;

pub use memory::InMemoryPersistence;
pub use postgres::{PgExecutor, SqlConfig};
pub use sql::{SqlDialect, SqlExecutor, SqlPersistence};
pub use traits::PersistenceLayer;

//! In-memory persistence driver.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use lexis_core::{LexisResult, NamespaceBlock, StorageError};

use super::traits::PersistenceLayer;

/// Rows grouped by (namespace, locale), then keyed by name.
type Rows = HashMap<(String, String), HashMap<String, String>>;

/// Map-backed persistence layer.
///
/// Upserts take the write lock for the whole map, so concurrent writes to
/// the same key serialize and the last one wins.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    rows: RwLock<Rows>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row at construction time.
    pub fn with_entry(
        self,
        namespace: &str,
        locale: &str,
        name: &str,
        content: &str,
    ) -> Self {
        if let Ok(mut rows) = self.rows.write() {
            upsert(&mut rows, namespace, name, locale, content);
        }
        self
    }

    /// Total number of stored rows across all blocks.
    pub fn row_count(&self) -> usize {
        self.rows
            .read()
            .map(|rows| rows.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    /// Read one row directly, bypassing every cache tier.
    pub fn content(&self, namespace: &str, locale: &str, name: &str) -> Option<String> {
        self.rows.read().ok().and_then(|rows| {
            rows.get(&(namespace.to_string(), locale.to_string()))
                .and_then(|block| block.get(name).cloned())
        })
    }
}

fn upsert(rows: &mut Rows, namespace: &str, name: &str, locale: &str, content: &str) {
    rows.entry((namespace.to_string(), locale.to_string()))
        .or_default()
        .insert(name.to_string(), content.to_string());
}

#[async_trait]
impl PersistenceLayer for InMemoryPersistence {
    async fn get_namespace_content(
        &self,
        namespace: &str,
        locale: &str,
    ) -> LexisResult<NamespaceBlock> {
        let rows = self.rows.read().map_err(|_| StorageError::LockPoisoned)?;

        Ok(rows
            .get(&(namespace.to_string(), locale.to_string()))
            .cloned()
            .map(NamespaceBlock::from)
            .unwrap_or_default())
    }

    async fn save_content(
        &self,
        namespace: &str,
        name: &str,
        locale: &str,
        content: &str,
    ) -> LexisResult<()> {
        let mut rows = self.rows.write().map_err(|_| StorageError::LockPoisoned)?;
        upsert(&mut rows, namespace, name, locale, content);
        Ok(())
    }
}

//! Persistence layer trait.

use std::sync::Arc;

use async_trait::async_trait;
use lexis_core::{LexisResult, NamespaceBlock};

/// Durable storage of (namespace, name, locale) → content.
///
/// This trait abstracts over the actual storage engine, allowing the content
/// provider to work with any backend that can read a block and upsert a row.
#[async_trait]
pub trait PersistenceLayer: Send + Sync {
    /// Read every (name, content) pair stored for `namespace` and `locale`.
    ///
    /// Returns an empty block when nothing is stored.
    async fn get_namespace_content(
        &self,
        namespace: &str,
        locale: &str,
    ) -> LexisResult<NamespaceBlock>;

    /// Insert the row, or overwrite its content if the
    /// (namespace, name, locale) triple already exists.
    ///
    /// Concurrent upserts of the same key must not corrupt the row; the last
    /// writer wins.
    async fn save_content(
        &self,
        namespace: &str,
        name: &str,
        locale: &str,
        content: &str,
    ) -> LexisResult<()>;
}

#[async_trait]
impl<T: PersistenceLayer + ?Sized> PersistenceLayer for Arc<T> {
    async fn get_namespace_content(
        &self,
        namespace: &str,
        locale: &str,
    ) -> LexisResult<NamespaceBlock> {
        (**self).get_namespace_content(namespace, locale).await
    }

    async fn save_content(
        &self,
        namespace: &str,
        name: &str,
        locale: &str,
        content: &str,
    ) -> LexisResult<()> {
        (**self).save_content(namespace, name, locale, content).await
    }
}

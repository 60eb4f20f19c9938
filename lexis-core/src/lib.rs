//! Lexis Core - Content Types
//!
//! Pure data structures with no I/O. Every other Lexis crate depends on this.
//! This crate contains the content model, cache key derivation, configuration
//! and the error taxonomy - no tier orchestration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod config;
pub mod error;
pub mod key;

pub use config::LexisConfig;
pub use error::{ConfigError, LexisError, LexisResult, StorageError};
pub use key::{
    validate_cache_key, CacheKey, CACHE_KEY_PREFIX, MAX_CACHE_KEY_LEN, RESERVED_KEY_CHARS,
};

// ============================================================================
// CONTENT KEY
// ============================================================================

/// Identifies exactly one string of content.
///
/// The namespace groups related strings (a page, a feature area), the locale
/// selects the language variant and the name picks the string within the
/// namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentKey {
    pub namespace: String,
    pub locale: String,
    pub name: String,
}

impl ContentKey {
    pub fn new(
        namespace: impl Into<String>,
        locale: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            locale: locale.into(),
            name: name.into(),
        }
    }

    /// Cache key of the block this string lives in.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(&self.namespace, &self.locale)
    }

    /// The same name and namespace, in another locale.
    pub fn with_locale(&self, locale: impl Into<String>) -> Self {
        Self {
            namespace: self.namespace.clone(),
            locale: locale.into(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.locale, self.name)
    }
}

// ============================================================================
// NAMESPACE BLOCK
// ============================================================================

/// Every name → content pair stored for one (namespace, locale).
///
/// The block is the unit of loading, caching and invalidation. It is built
/// whole (from persistence rows or a cache entry) and never patched in
/// place; a write to any name drops the entire block from every cache tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamespaceBlock {
    entries: HashMap<String, String>,
}

impl NamespaceBlock {
    /// An empty block, as returned for a (namespace, locale) with no rows.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.entries
    }
}

impl From<HashMap<String, String>> for NamespaceBlock {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, String)> for NamespaceBlock {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for NamespaceBlock {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

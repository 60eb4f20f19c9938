//! Cache key derivation for namespace blocks.
//!
//! A `CacheKey` addresses one (namespace, locale) block in both the
//! in-process tier and the shared cache store. Keys are derived, never
//! parsed: the only constructor is [`CacheKey::derive`], so every key
//! handed to a cache store already satisfies [`validate_cache_key`].

use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::StorageError;

/// Reserved prefix for every derived key.
pub const CACHE_KEY_PREFIX: &str = "__lexis_";

/// Longest key a cache store is required to accept.
pub const MAX_CACHE_KEY_LEN: usize = 64;

/// Characters cache stores reserve for their own key syntax.
pub const RESERVED_KEY_CHARS: &[char] = &['{', '}', '(', ')', '/', '\\', '@', ':'];

/// Separator between namespace and locale in readable keys.
const SEPARATOR: char = '.';

/// Marker that opens a digest key. Never produced by a readable key.
const DIGEST_MARKER: char = '~';

/// Number of digest bytes kept in a digest key (hex-encoded to twice this).
const DIGEST_BYTES: usize = 16;

/// Key of one namespace block.
///
/// # Format
///
/// When both parts are made only of `[A-Za-z0-9_-]` and the result fits in
/// [`MAX_CACHE_KEY_LEN`], the key is readable:
///
/// ```text
/// __lexis_{namespace}.{locale}
/// ```
///
/// Neither part may contain `.`, so the split is unique. Anything else
/// (dots, reserved characters, unicode, long names) maps to a digest key:
///
/// ```text
/// __lexis_~{hex(sha256(len(namespace) ++ namespace ++ locale)[..16])}
/// ```
///
/// The `~` marker keeps the two forms disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    inner: String,
}

impl CacheKey {
    /// Derive the key for a (namespace, locale) pair.
    pub fn derive(namespace: &str, locale: &str) -> Self {
        let readable_len = CACHE_KEY_PREFIX.len() + namespace.len() + 1 + locale.len();

        let inner = if is_plain(namespace) && is_plain(locale) && readable_len <= MAX_CACHE_KEY_LEN
        {
            format!("{CACHE_KEY_PREFIX}{namespace}{SEPARATOR}{locale}")
        } else {
            let mut hasher = Sha256::new();
            hasher.update((namespace.len() as u64).to_le_bytes());
            hasher.update(namespace.as_bytes());
            hasher.update(locale.as_bytes());
            let digest = hasher.finalize();
            format!(
                "{CACHE_KEY_PREFIX}{DIGEST_MARKER}{}",
                hex::encode(&digest[..DIGEST_BYTES])
            )
        };

        Self { inner }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether this key was digested rather than spelled out.
    pub fn is_digest(&self) -> bool {
        self.inner[CACHE_KEY_PREFIX.len()..].starts_with(DIGEST_MARKER)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

fn is_plain(part: &str) -> bool {
    part.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check a key against the rules every cache store enforces.
///
/// Rejects empty keys, keys longer than [`MAX_CACHE_KEY_LEN`] bytes and keys
/// containing any of [`RESERVED_KEY_CHARS`].
pub fn validate_cache_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidCacheKey {
            key: key.to_string(),
            reason: "key is empty".to_string(),
        });
    }

    if key.len() > MAX_CACHE_KEY_LEN {
        return Err(StorageError::InvalidCacheKey {
            key: key.to_string(),
            reason: format!("key is longer than {MAX_CACHE_KEY_LEN} bytes"),
        });
    }

    if let Some(c) = key.chars().find(|c| RESERVED_KEY_CHARS.contains(c)) {
        return Err(StorageError::InvalidCacheKey {
            key: key.to_string(),
            reason: format!("reserved character '{c}'"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_readable_key_format() {
        let key = CacheKey::derive("ui", "en");
        assert_eq!(key.as_str(), "__lexis_ui.en");
        assert!(!key.is_digest());
    }

    #[test]
    fn test_empty_locale_is_readable() {
        let key = CacheKey::derive("ui", "");
        assert_eq!(key.as_str(), "__lexis_ui.");
        assert!(validate_cache_key(key.as_str()).is_ok());
    }

    #[test]
    fn test_dotted_parts_do_not_collide() {
        let a = CacheKey::derive("a.b", "c");
        let b = CacheKey::derive("a", "b.c");
        assert_ne!(a, b);
        assert!(a.is_digest());
        assert!(b.is_digest());
    }

    #[test]
    fn test_reserved_characters_are_digested() {
        let key = CacheKey::derive("admin/pages", "en@latin");
        assert!(key.is_digest());
        assert!(validate_cache_key(key.as_str()).is_ok());
    }

    #[test]
    fn test_long_namespace_is_digested() {
        let namespace = "n".repeat(80);
        let key = CacheKey::derive(&namespace, "en");
        assert!(key.is_digest());
        assert!(key.as_str().len() <= MAX_CACHE_KEY_LEN);
    }

    #[test]
    fn test_derivation_is_stable() {
        assert_eq!(CacheKey::derive("ui", "pt.BR"), CacheKey::derive("ui", "pt.BR"));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(matches!(
            validate_cache_key(""),
            Err(StorageError::InvalidCacheKey { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_reserved() {
        for c in RESERVED_KEY_CHARS {
            let key = format!("ns{c}en");
            assert!(
                validate_cache_key(&key).is_err(),
                "key with {c:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_too_long() {
        let key = "k".repeat(MAX_CACHE_KEY_LEN + 1);
        assert!(validate_cache_key(&key).is_err());
        assert!(validate_cache_key(&key[..MAX_CACHE_KEY_LEN]).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Property: every derived key passes store validation.
        #[test]
        fn prop_derived_keys_are_valid(namespace in ".{0,80}", locale in ".{0,24}") {
            let key = CacheKey::derive(&namespace, &locale);
            prop_assert!(validate_cache_key(key.as_str()).is_ok());
            prop_assert!(key.as_str().starts_with(CACHE_KEY_PREFIX));
        }

        /// Property: distinct (namespace, locale) pairs never share a key.
        #[test]
        fn prop_derivation_is_injective(
            ns1 in "[a-z._~-]{0,8}",
            l1 in "[a-z._~-]{0,5}",
            ns2 in "[a-z._~-]{0,8}",
            l2 in "[a-z._~-]{0,5}",
        ) {
            let k1 = CacheKey::derive(&ns1, &l1);
            let k2 = CacheKey::derive(&ns2, &l2);
            if (ns1.as_str(), l1.as_str()) != (ns2.as_str(), l2.as_str()) {
                prop_assert_ne!(k1, k2);
            } else {
                prop_assert_eq!(k1, k2);
            }
        }

        /// Property: shifting characters across the separator changes the key.
        #[test]
        fn prop_separator_shift_changes_key(left in "[a-z]{1,6}", mid in "[a-z.]{1,6}", right in "[a-z]{0,6}") {
            let a = CacheKey::derive(&format!("{left}{mid}"), &right);
            let b = CacheKey::derive(&left, &format!("{mid}{right}"));
            prop_assert_ne!(a, b);
        }
    }
}

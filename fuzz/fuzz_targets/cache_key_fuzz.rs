//! Fuzz test for cache key derivation
//!
//! Splits arbitrary bytes into a namespace and a locale and checks that the
//! derived key always passes cache-store validation and never collides with
//! the key of a different pair.
//!
//! Run with: cargo +nightly fuzz run cache_key_fuzz -- -max_total_time=60

#![no_main]

use lexis_core::{validate_cache_key, CacheKey};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    // First NUL splits namespace from locale; without one the locale is empty.
    let (namespace, locale) = input.split_once('\0').unwrap_or((input, ""));

    let key = CacheKey::derive(namespace, locale);
    assert!(
        validate_cache_key(key.as_str()).is_ok(),
        "derived key failed validation: {key}"
    );
    assert_eq!(key, CacheKey::derive(namespace, locale));

    // Shifting one character across the boundary must change the key.
    if let Some(c) = locale.chars().next() {
        let mut shifted = namespace.to_string();
        shifted.push(c);
        let other = CacheKey::derive(&shifted, &locale[c.len_utf8()..]);
        assert_ne!(key, other, "keys collide for {namespace:?}/{locale:?}");
    }
});

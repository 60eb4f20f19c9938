//! Property-based tests for the content provider.
//!
//! - Reads are idempotent and the second read is served in-process.
//! - A saved value is what the next read returns, for any key shape.
//! - The requested locale wins over the fallback; the fallback fills gaps.

use lexis_test_utils::fixtures::Harness;
use lexis_test_utils::generators::{
    arb_content, arb_content_key, arb_distinct_locales, arb_name, arb_namespace,
};
use proptest::prelude::*;
use tokio::runtime::Runtime;

fn test_runtime() -> Result<Runtime, TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_save_then_get_returns_saved(key in arb_content_key(), content in arb_content()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let h = Harness::seeded("", &[]);

            h.provider.save(&key, &content).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            let read = h.provider.get(&key).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(&read, &content);

            // A fresh provider on the same collaborators sees the same value.
            let read = h.sibling().get(&key).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(read, content);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_second_read_is_served_locally(
        key in arb_content_key(),
        content in arb_content(),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let h = Harness::seeded(
                "",
                &[(key.namespace.as_str(), key.locale.as_str(), key.name.as_str(), content.as_str())],
            );

            let first = h.provider.get(&key).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            let reads = h.persistence.reads();
            let second = h.provider.get(&key).await.map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(&first, &content);
            prop_assert_eq!(first, second);
            prop_assert_eq!(h.persistence.reads(), reads);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_fallback_fills_missing_locale(
        namespace in arb_namespace(),
        name in arb_name(),
        (locale, fallback) in arb_distinct_locales(),
        content in arb_content(),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let h = Harness::seeded(
                &fallback,
                &[(namespace.as_str(), fallback.as_str(), name.as_str(), content.as_str())],
            );

            let read = h
                .provider
                .get_content(&namespace, &locale, &name)
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(read, content);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_requested_locale_beats_fallback(
        namespace in arb_namespace(),
        name in arb_name(),
        (locale, fallback) in arb_distinct_locales(),
        local in "[a-z]{1,8}",
        default in "[A-Z]{1,8}",
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let h = Harness::seeded(
                &fallback,
                &[
                    (namespace.as_str(), fallback.as_str(), name.as_str(), default.as_str()),
                    (namespace.as_str(), locale.as_str(), name.as_str(), local.as_str()),
                ],
            );

            let read = h
                .provider
                .get_content(&namespace, &locale, &name)
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(read, local);
            prop_assert_eq!(h.provider.stats().fallbacks, 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn prop_missing_everywhere_is_empty(
        key in arb_content_key(),
        fallback in "[a-z]{2}",
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let h = Harness::seeded(&fallback, &[]);
            let read = h.provider.get(&key).await.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(read, "");
            Ok::<(), TestCaseError>(())
        })?;
    }
}

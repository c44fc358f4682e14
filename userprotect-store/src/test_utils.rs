// SPDX-License-Identifier: MIT OR Apache-2.0

/// Macro to run the same test logic against all store backend implementations.
///
/// This macro takes a closure that will be executed against each store type:
/// - In-memory store (`MemoryStore`)
/// - SQLite store (`SqliteStore`)
///
/// Every run gets a fresh and empty store. Writes inside the body need to begin and commit their
/// own transactions.
///
/// ## Example
///
/// ```rust
/// # use std::collections::BTreeSet;
/// # use userprotect_core::{PageId, Subject};
/// # use userprotect_store::{OverrideStore, assert_all_stores};
/// # async fn run() {
/// assert_all_stores!(|store| async {
///     let subject = Subject::page(PageId::new(1).unwrap());
///     let rows = store.overrides_for_subject(&subject, &BTreeSet::new()).await.unwrap();
///     assert!(rows.is_empty());
/// });
/// # }
/// ```
#[macro_export]
macro_rules! assert_all_stores {
    (|$store:ident| $test_body:expr) => {
        // Test with MemoryStore.
        {
            let $store = $crate::memory::MemoryStore::default();
            $test_body.await;
        }

        // Test with SqliteStore.
        {
            let $store = $crate::sqlite::SqliteStoreBuilder::new()
                .random_memory_url()
                // We're running in a single test thread and can't have more parallel connections.
                .max_connections(1)
                .build()
                .await
                .unwrap();
            $test_body.await;
        }
    };
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interfaces and implementations of persistence layers for permission overrides.
//!
//! Overrides live in two logical tables, one for existing pages and one for titles which do not
//! exist yet. Both are accessed through the [`OverrideStore`] trait, the table is picked by the
//! variant of the `Subject` a query is made for.
//!
//! ## Transactions
//!
//! Reads always see committed state. Writes need to happen inside a transaction which is started
//! with [`Transaction::begin`], this returns a permit which is handed back on
//! [`Transaction::commit`] or [`Transaction::rollback`]. Replacing the override set of a subject
//! (delete, then insert) is only ever observable in full or not at all:
//!
//! ```rust
//! # use std::collections::BTreeSet;
//! # use userprotect_core::{Direction, OverrideRow, PageId, RightType, Subject, Timestamp, UserId};
//! # use userprotect_store::{MemoryStore, OverrideStore, Transaction};
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let subject = Subject::page(PageId::new(42)?);
//!
//! let permit = store.begin().await?;
//! store.delete_overrides(&subject).await?;
//! store
//!     .insert_overrides(&[OverrideRow::new(
//!         subject.clone(),
//!         RightType::All,
//!         UserId::new(7),
//!         Direction::Added,
//!         Timestamp::now(),
//!     )])
//!     .await?;
//! store.commit(permit).await?;
//!
//! let rows = store
//!     .overrides_for_user(&subject, UserId::new(7), &BTreeSet::from([RightType::All]))
//!     .await?;
//! assert_eq!(rows.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Store implementations
//!
//! An in-memory store is provided in the form of `MemoryStore`, gated by the `memory` feature
//! flag. A SQLite store is provided in the form of `SqliteStore`, gated by the `sqlite` feature
//! flag. Both are enabled by default.
#[cfg(feature = "memory")]
pub mod memory;
pub mod overrides;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(any(test, feature = "test_utils"))]
mod test_utils;
mod traits;

#[cfg(feature = "memory")]
pub use memory::{MemoryStore, MemoryStoreError};
pub use overrides::OverrideStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteError, SqliteStore, SqliteStoreBuilder};
pub use traits::{Transaction, TransactionPermit, TransactionSlot};

// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;
use std::error::Error;

use userprotect_core::{OverrideRow, RightType, Subject, UserId};

/// Interface for storing, deleting and querying permission overrides.
///
/// Rows of existing pages and rows of pending titles are kept apart, the `Subject` variant
/// decides which of both is touched. Queries return rows in the order they have been inserted.
pub trait OverrideStore {
    type Error: Error;

    /// Returns all committed overrides of one user on a subject which have one of the given right
    /// types.
    fn overrides_for_user(
        &self,
        subject: &Subject,
        user_id: UserId,
        right_types: &BTreeSet<RightType>,
    ) -> impl Future<Output = Result<Vec<OverrideRow>, Self::Error>>;

    /// Returns all committed overrides of all users on a subject which have one of the given
    /// right types.
    fn overrides_for_subject(
        &self,
        subject: &Subject,
        right_types: &BTreeSet<RightType>,
    ) -> impl Future<Output = Result<Vec<OverrideRow>, Self::Error>>;

    /// Deletes all overrides of a subject, regardless of right type, user or direction.
    ///
    /// Returns the number of removed rows. Needs to run inside a transaction.
    fn delete_overrides(&self, subject: &Subject) -> impl Future<Output = Result<u64, Self::Error>>;

    /// Inserts overrides.
    ///
    /// Returns the number of inserted rows. Needs to run inside a transaction.
    fn insert_overrides(
        &self,
        rows: &[OverrideRow],
    ) -> impl Future<Output = Result<u64, Self::Error>>;
}

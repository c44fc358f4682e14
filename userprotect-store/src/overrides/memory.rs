// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

use userprotect_core::{OverrideRow, RightType, Subject, UserId};

use crate::memory::{MemoryStore, MemoryStoreError};
use crate::overrides::OverrideStore;

impl OverrideStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn overrides_for_user(
        &self,
        subject: &Subject,
        user_id: UserId,
        right_types: &BTreeSet<RightType>,
    ) -> Result<Vec<OverrideRow>, Self::Error> {
        let committed = self.committed.borrow();
        let result = committed
            .get(subject)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.user_id == user_id && right_types.contains(&row.right_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(result)
    }

    async fn overrides_for_subject(
        &self,
        subject: &Subject,
        right_types: &BTreeSet<RightType>,
    ) -> Result<Vec<OverrideRow>, Self::Error> {
        let committed = self.committed.borrow();
        let result = committed
            .get(subject)
            .map(|rows| {
                rows.iter()
                    .filter(|row| right_types.contains(&row.right_type))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(result)
    }

    async fn delete_overrides(&self, subject: &Subject) -> Result<u64, Self::Error> {
        self.staged(|tables| {
            tables
                .remove(subject)
                .map(|rows| rows.len() as u64)
                .unwrap_or_default()
        })
    }

    async fn insert_overrides(&self, rows: &[OverrideRow]) -> Result<u64, Self::Error> {
        self.staged(|tables| {
            for row in rows {
                tables
                    .entry(row.subject.clone())
                    .or_default()
                    .push(row.clone());
            }
            rows.len() as u64
        })
    }
}

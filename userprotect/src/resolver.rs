// SPDX-License-Identifier: MIT OR Apache-2.0

//! Computes the net added and removed rights of a user on a subject.
use std::collections::BTreeSet;

use userprotect_core::{Direction, OverrideRow, RightName, RightType};

/// Net override of one user on one subject.
///
/// Wildcard rows are already expanded into the rights applicable at resolution time, so both sets
/// only ever contain named rights.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedOverride {
    pub removed: BTreeSet<RightName>,
    pub added: BTreeSet<RightName>,
}

impl ResolvedOverride {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Folds stored rows into a resolved override.
///
/// A wildcard row puts all applicable rights into the bucket of its direction. Named rows are
/// unioned into their bucket. Rows are expected to be filtered by the applicable rights already,
/// which makes the result independent of the order of the rows.
pub fn accumulate(rows: &[OverrideRow], applicable: &BTreeSet<RightName>) -> ResolvedOverride {
    let mut resolved = ResolvedOverride::default();

    for row in rows {
        let bucket = match row.direction {
            Direction::Removed => &mut resolved.removed,
            Direction::Added => &mut resolved.added,
        };

        match &row.right_type {
            RightType::All => bucket.extend(applicable.iter().cloned()),
            RightType::Named(name) => {
                bucket.insert(name.clone());
            }
        }
    }

    resolved
}

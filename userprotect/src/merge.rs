// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;

use userprotect_core::RightName;

use crate::resolver::ResolvedOverride;

/// Permissions of a user on a subject after applying overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedPermissions {
    /// Rights the user holds.
    pub effective: BTreeSet<RightName>,

    /// Rights from the base set which were taken away by an override.
    pub explicitly_lost: BTreeSet<RightName>,
}

impl MergedPermissions {
    /// Base permissions without any override applied.
    pub fn unchanged(base: &BTreeSet<RightName>) -> Self {
        Self {
            effective: base.clone(),
            explicitly_lost: BTreeSet::new(),
        }
    }

    pub fn contains(&self, right: &RightName) -> bool {
        self.effective.contains(right)
    }

    pub fn lost(&self, right: &RightName) -> bool {
        self.explicitly_lost.contains(right)
    }
}

/// Applies a resolved override to a base permission set.
///
/// Removals win over additions: a right which is both added and removed is not held.
pub fn merge(base: &BTreeSet<RightName>, resolved: &ResolvedOverride) -> MergedPermissions {
    let effective = base
        .union(&resolved.added)
        .filter(|right| !resolved.removed.contains(*right))
        .cloned()
        .collect();

    let explicitly_lost = resolved.removed.intersection(base).cloned().collect();

    MergedPermissions {
        effective,
        explicitly_lost,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use userprotect_core::RightName;

    use crate::resolver::ResolvedOverride;

    use super::{MergedPermissions, merge};

    fn names(values: &[&str]) -> BTreeSet<RightName> {
        values.iter().map(|value| value.parse().unwrap()).collect()
    }

    #[test]
    fn empty_override_keeps_base() {
        let base = names(&["read", "edit"]);
        assert_eq!(
            merge(&base, &ResolvedOverride::default()),
            MergedPermissions::unchanged(&base)
        );
    }

    #[test]
    fn add_and_remove() {
        let base = names(&["read", "edit"]);
        let resolved = ResolvedOverride {
            removed: names(&["edit", "upload"]),
            added: names(&["move", "upload"]),
        };

        let merged = merge(&base, &resolved);
        assert_eq!(merged.effective, names(&["move", "read"]));

        // Only rights held before count as explicitly lost.
        assert_eq!(merged.explicitly_lost, names(&["edit"]));
        assert!(merged.lost(&"edit".parse().unwrap()));
        assert!(!merged.lost(&"upload".parse().unwrap()));
    }
}

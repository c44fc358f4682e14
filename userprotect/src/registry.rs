// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rights which can be overridden for a subject, depending on whether it exists.
use std::collections::BTreeSet;
use std::sync::OnceLock;

use userprotect_core::{RightName, RightType};

use crate::config::Config;

/// Rights which only make sense for titles which do not exist yet.
pub const CREATE_RIGHTS: [&str; 2] = ["createpage", "createtalk"];

/// Right to manage overrides itself, it is treated like the create rights.
pub const OVERRIDE_RIGHT: &str = "userprotect";

#[derive(Debug)]
struct ApplicableTypes {
    edit: BTreeSet<RightName>,
    create: BTreeSet<RightName>,
}

/// Splits the protectable rights into two disjoint sets: "edit-like" rights relevant to existing
/// pages and "create-like" rights relevant to titles which do not exist yet.
///
/// Both sets are derived once on first access and kept for the lifetime of the registry.
#[derive(Debug)]
pub struct TypeRegistry {
    protectable: BTreeSet<RightName>,
    sets: OnceLock<ApplicableTypes>,
}

impl TypeRegistry {
    pub fn new(config: &Config) -> Self {
        Self::from_rights(config.protectable_rights())
    }

    pub fn from_rights(protectable: impl IntoIterator<Item = RightName>) -> Self {
        Self {
            protectable: protectable.into_iter().collect(),
            sets: OnceLock::new(),
        }
    }

    fn sets(&self) -> &ApplicableTypes {
        self.sets.get_or_init(|| {
            let (create, edit): (BTreeSet<RightName>, BTreeSet<RightName>) = self
                .protectable
                .iter()
                .cloned()
                .partition(|right| is_create_right(right));
            ApplicableTypes { edit, create }
        })
    }

    /// Returns the rights which can be overridden on an existing page (`exists = true`) or a
    /// pending title (`exists = false`).
    pub fn applicable_types(&self, exists: bool) -> &BTreeSet<RightName> {
        let sets = self.sets();
        if exists { &sets.edit } else { &sets.create }
    }

    /// Right types to look up in storage: all applicable rights and the wildcard.
    pub fn query_types(&self, exists: bool) -> BTreeSet<RightType> {
        self.applicable_types(exists)
            .iter()
            .cloned()
            .map(RightType::Named)
            .chain(std::iter::once(RightType::All))
            .collect()
    }

    /// Returns `true` if overrides of this right type can be stored for the given existence
    /// state. The wildcard is always accepted.
    pub fn is_applicable(&self, exists: bool, right_type: &RightType) -> bool {
        match right_type {
            RightType::All => true,
            RightType::Named(name) => self.applicable_types(exists).contains(name),
        }
    }
}

fn is_create_right(right: &RightName) -> bool {
    CREATE_RIGHTS.contains(&right.as_str()) || right.as_str() == OVERRIDE_RIGHT
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use userprotect_core::{RightName, RightType};

    use crate::config::Config;

    use super::TypeRegistry;

    fn names(values: &[&str]) -> BTreeSet<RightName> {
        values.iter().map(|value| value.parse().unwrap()).collect()
    }

    #[test]
    fn partition_default_rights() {
        let registry = TypeRegistry::new(&Config::default());
        assert_eq!(
            registry.applicable_types(true),
            &names(&["edit", "move", "upload"])
        );
        assert_eq!(
            registry.applicable_types(false),
            &names(&["createpage", "createtalk", "userprotect"])
        );
        assert!(
            registry
                .applicable_types(true)
                .is_disjoint(registry.applicable_types(false))
        );
    }

    #[test]
    fn empty_configuration() {
        let registry = TypeRegistry::from_rights(BTreeSet::new());
        assert!(registry.applicable_types(true).is_empty());
        assert!(registry.applicable_types(false).is_empty());
        assert_eq!(
            registry.query_types(true),
            BTreeSet::from([RightType::All])
        );
    }

    #[test]
    fn memoized() {
        let registry = TypeRegistry::new(&Config::with_restriction_types(&["edit"]));
        let first: *const _ = registry.applicable_types(true);
        let second: *const _ = registry.applicable_types(true);
        assert_eq!(first, second);
    }

    #[test]
    fn applicable_right_types() {
        let registry = TypeRegistry::new(&Config::with_restriction_types(&["edit", "createpage"]));
        let edit: RightType = "edit".parse().unwrap();
        let createpage: RightType = "createpage".parse().unwrap();

        assert!(registry.is_applicable(true, &edit));
        assert!(!registry.is_applicable(false, &edit));
        assert!(registry.is_applicable(false, &createpage));
        assert!(!registry.is_applicable(true, &createpage));
        assert!(registry.is_applicable(true, &RightType::All));
        assert!(registry.is_applicable(false, &RightType::All));
    }
}

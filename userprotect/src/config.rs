// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;
use userprotect_core::{RightError, RightName};

/// Rights which can be protected when nothing else was configured.
pub const DEFAULT_RESTRICTION_TYPES: [&str; 6] = [
    "edit",
    "move",
    "upload",
    "createpage",
    "createtalk",
    "userprotect",
];

/// Configuration for an override engine instance.
///
/// Configuration is read once when the engine gets built and is treated as immutable afterwards.
/// Changing the protectable rights needs a new engine instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Right names which can be overridden per user. Rights mapped to `false` are switched off.
    pub restriction_types: BTreeMap<String, bool>,

    /// Location of the SQLite database holding the overrides.
    pub database_url: String,

    /// Maximum number of pooled database connections. Every connection to an in-memory database
    /// opens a database of its own, keep this at 1 for memory URLs.
    pub max_connections: u32,

    /// Run pending schema migrations when connecting to the database.
    pub run_migrations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            restriction_types: DEFAULT_RESTRICTION_TYPES
                .iter()
                .map(|name| (name.to_string(), true))
                .collect(),
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
            run_migrations: true,
        }
    }
}

impl Config {
    /// Default configuration with only the given rights being protectable.
    pub fn with_restriction_types(names: &[&str]) -> Self {
        Self {
            restriction_types: names.iter().map(|name| (name.to_string(), true)).collect(),
            ..Default::default()
        }
    }

    /// Returns all enabled and valid protectable right names.
    ///
    /// Entries which are switched off are dropped silently, invalid names and the reserved
    /// wildcard are dropped with a warning.
    pub fn protectable_rights(&self) -> BTreeSet<RightName> {
        self.restriction_types
            .iter()
            .filter(|(_, enabled)| **enabled)
            .filter_map(|(name, _)| match RightName::new(name) {
                Ok(right) => Some(right),
                Err(RightError::Reserved) => {
                    warn!(right = %name, "ignoring configured right, it is the wildcard");
                    None
                }
                Err(err) => {
                    warn!(right = %name, "ignoring invalid configured right: {err}");
                    None
                }
            })
            .collect()
    }
}

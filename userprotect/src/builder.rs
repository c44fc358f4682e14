// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::debug;
use userprotect_store::{SqliteStore, SqliteStoreBuilder};

use crate::config::Config;
use crate::directory::UserDirectory;
use crate::error::OverrideError;
use crate::manager::Manager;
use crate::registry::TypeRegistry;

/// Builds a `Manager` persisting overrides in SQLite.
#[derive(Clone, Debug, Default)]
pub struct ManagerBuilder {
    config: Config,
}

impl ManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn database_url(mut self, url: &str) -> Self {
        self.config.database_url = url.to_string();
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.config.max_connections = max_connections;
        self
    }

    pub fn run_migrations(mut self, run_migrations: bool) -> Self {
        self.config.run_migrations = run_migrations;
        self
    }

    /// Sets the protectable rights, all of them enabled.
    pub fn restriction_types(mut self, names: &[&str]) -> Self {
        self.config.restriction_types = names.iter().map(|name| (name.to_string(), true)).collect();
        self
    }

    pub async fn build<'a, D>(
        self,
        directory: D,
    ) -> Result<Manager<SqliteStore<'a>, D>, OverrideError>
    where
        D: UserDirectory,
    {
        let store = SqliteStoreBuilder::new()
            .database_url(&self.config.database_url)
            .max_connections(self.config.max_connections)
            .run_default_migrations(self.config.run_migrations)
            .build()
            .await
            .map_err(OverrideError::storage)?;

        let registry = TypeRegistry::new(&self.config);
        debug!(
            database = %self.config.database_url,
            existing = ?registry.applicable_types(true),
            pending = ?registry.applicable_types(false),
            "built override manager"
        );

        Ok(Manager::new(store, directory, registry))
    }
}

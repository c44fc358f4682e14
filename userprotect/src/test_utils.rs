// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixtures for testing the override engine.
use userprotect_core::{RightName, RightType, UserId, UserName};
use userprotect_store::MemoryStore;

use crate::config::Config;
use crate::directory::MemoryDirectory;
use crate::manager::Manager;
use crate::registry::TypeRegistry;

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

pub fn user(name: &str) -> UserName {
    UserName::new(name).expect("valid user name")
}

pub fn right(name: &str) -> RightName {
    RightName::new(name).expect("valid right name")
}

pub fn right_type(name: &str) -> RightType {
    name.parse().expect("valid right type")
}

/// Directory with one account per name, numbered from 1 in the given order.
pub fn directory(names: &[&str]) -> MemoryDirectory {
    let mut directory = MemoryDirectory::new();
    for (index, name) in names.iter().enumerate() {
        directory.insert(user(name), UserId::new(index as u64 + 1));
    }
    directory
}

/// Registry where exactly the given rights are protectable.
pub fn registry(rights: &[&str]) -> TypeRegistry {
    TypeRegistry::new(&Config::with_restriction_types(rights))
}

/// Manager backed by an in-memory store.
pub fn memory_manager(rights: &[&str], users: &[&str]) -> Manager<MemoryStore, MemoryDirectory> {
    Manager::new(MemoryStore::new(), directory(users), registry(rights))
}

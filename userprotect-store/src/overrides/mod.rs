// SPDX-License-Identifier: MIT OR Apache-2.0

//! `OverrideStore` trait for persisting per-user permission overrides as well as concrete
//! `MemoryStore` and `SqliteStore` implementations.
#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "sqlite")]
mod models;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

pub use traits::OverrideStore;

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-page, per-user permission overrides.
//!
//! Administrators grant ("add") or revoke ("remove") single rights, or all applicable rights at
//! once with the `all` wildcard, for named users on an existing page or on a title which does not
//! exist yet. Whenever an authorization decision is made these overrides are merged into the
//! permissions the user would normally have.
//!
//! The [`Manager`] resolves overrides of a (subject, user) pair, merges them into base
//! permissions and atomically replaces the overrides of a subject when administrators submit
//! changes. Resolutions are cached in a request-scoped [`Session`]. An [`Authorizer`] decorates a
//! base authorization service with the manager and turns the result into a [`Decision`].
//!
//! ```rust
//! # use std::collections::BTreeSet;
//! # use userprotect::{
//! #     Actor, Config, Manager, MemoryDirectory, OverrideSet, Session, TypeRegistry,
//! # };
//! # use userprotect_core::{PageId, RightName, RightType, Subject, UserId, UserName};
//! # use userprotect_store::MemoryStore;
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut directory = MemoryDirectory::new();
//! directory.insert(UserName::new("carol")?, UserId::new(3));
//!
//! let registry = TypeRegistry::new(&Config::with_restriction_types(&["edit", "move"]));
//! let manager = Manager::new(MemoryStore::new(), directory, registry);
//! let subject = Subject::page(PageId::new(42)?);
//!
//! // Take away all applicable rights from Carol on page 42.
//! let mut overrides = OverrideSet::new();
//! overrides.remove(RightType::All, UserName::new("carol")?);
//! manager.save(&mut Session::new(), &subject, &overrides).await?;
//!
//! let base = BTreeSet::from([RightName::new("edit")?, RightName::new("read")?]);
//! let merged = manager
//!     .merge(&mut Session::new(), &base, &subject, &Actor::User(UserId::new(3)))
//!     .await?;
//! assert_eq!(merged.effective, BTreeSet::from([RightName::new("read")?]));
//! # Ok(())
//! # }
//! ```
pub mod authorizer;
#[cfg(feature = "sqlite")]
mod builder;
pub mod config;
pub mod directory;
mod error;
mod manager;
pub mod merge;
pub mod overrides;
pub mod registry;
pub mod resolver;
mod session;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use authorizer::{
    Authorizer, BasePermissions, Decision, Denial, DenialReason, PermissionAdjuster,
};
#[cfg(feature = "sqlite")]
pub use builder::ManagerBuilder;
pub use config::Config;
pub use directory::{Actor, MemoryDirectory, UserDirectory, actor_for};
pub use error::{AuthorizationError, OverrideError};
pub use manager::{Manager, SaveOutcome};
pub use merge::MergedPermissions;
pub use overrides::OverrideSet;
pub use registry::TypeRegistry;
pub use resolver::ResolvedOverride;
pub use session::Session;

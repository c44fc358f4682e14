// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data types shared by the permission override engine and its storage backends.
//!
//! An _override_ is an explicit per-user addition or removal of a right on a _subject_. A subject
//! is either an existing page (identified by its immutable numeric id) or a title which does not
//! exist yet (identified by namespace and normalized title key). Overrides are stored as
//! [`OverrideRow`]s, one per (subject, right type, user, direction).
//!
//! All types validate their input on construction, invalid subjects, right names or user names
//! never reach a store.
pub mod right;
pub mod row;
pub mod subject;
pub mod timestamp;
pub mod user;

pub use right::{Direction, DirectionError, RightError, RightName, RightType, WILDCARD};
pub use row::OverrideRow;
pub use subject::{Namespace, PageId, Subject, SubjectError, TitleKey};
pub use timestamp::{Timestamp, TimestampError};
pub use user::{UserId, UserName, UserNameError};

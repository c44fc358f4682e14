// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error as StdError;

use thiserror::Error;
use userprotect_core::SubjectError;

type BoxedError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum OverrideError {
    /// Reading or writing overrides failed. Callers must not fall back to an empty override set
    /// as this would silently grant or withhold rights.
    #[error("override storage is unavailable: {0}")]
    StorageUnavailable(#[source] BoxedError),

    /// Looking up accounts in the user directory failed.
    #[error("user directory lookup failed: {0}")]
    Directory(#[source] BoxedError),

    /// Subject could not be constructed from the given namespace and title.
    #[error("invalid subject: {0}")]
    InvalidSubject(#[from] SubjectError),
}

impl OverrideError {
    pub(crate) fn storage<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::StorageUnavailable(Box::new(err))
    }

    pub(crate) fn directory<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Directory(Box::new(err))
    }
}

/// Errors of an authorization check which could not come to a decision.
#[derive(Debug, Error)]
pub enum AuthorizationError<E> {
    /// Base authorization service failed to compute permissions.
    #[error("base permissions unavailable: {0}")]
    Base(E),

    #[error(transparent)]
    Overrides(#[from] OverrideError),
}

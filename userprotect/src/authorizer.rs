// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorization checks with per-user overrides applied on top of base permissions.
use std::collections::BTreeSet;
use std::error::Error;

use tracing::warn;
use userprotect_core::{RightName, Subject};
use userprotect_store::{OverrideStore, Transaction};

use crate::directory::{Actor, UserDirectory};
use crate::error::{AuthorizationError, OverrideError};
use crate::manager::Manager;
use crate::merge::MergedPermissions;
use crate::session::Session;

/// Permissions an actor holds without any override, for example through group membership.
pub trait BasePermissions {
    type Error: Error;

    fn base_permissions(
        &self,
        actor: &Actor,
        subject: &Subject,
    ) -> impl Future<Output = Result<BTreeSet<RightName>, Self::Error>>;
}

/// Adjusts base permissions after they have been computed and before a decision is made.
pub trait PermissionAdjuster {
    fn adjust(
        &self,
        session: &mut Session,
        base: &BTreeSet<RightName>,
        subject: &Subject,
        actor: &Actor,
    ) -> impl Future<Output = Result<MergedPermissions, OverrideError>>;
}

impl<S, D, E> PermissionAdjuster for Manager<S, D>
where
    S: OverrideStore<Error = E> + Transaction<Error = E>,
    E: Error + Send + Sync + 'static,
    D: UserDirectory,
{
    async fn adjust(
        &self,
        session: &mut Session,
        base: &BTreeSet<RightName>,
        subject: &Subject,
        actor: &Actor,
    ) -> Result<MergedPermissions, OverrideError> {
        self.merge(session, base, subject, actor).await
    }
}

impl<T> PermissionAdjuster for &T
where
    T: PermissionAdjuster,
{
    async fn adjust(
        &self,
        session: &mut Session,
        base: &BTreeSet<RightName>,
        subject: &Subject,
        actor: &Actor,
    ) -> Result<MergedPermissions, OverrideError> {
        (**self).adjust(session, base, subject, actor).await
    }
}

/// Why an actor was denied a right.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DenialReason {
    /// The actor never held the right.
    NotGranted,

    /// The actor would hold the right but it was removed from them on this subject.
    ExplicitlyRemoved,

    /// Overrides could not be resolved. Access is denied as long as the overrides are unknown.
    OverridesUnavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Denial {
    pub right: RightName,
    pub reason: DenialReason,
}

impl Denial {
    /// Returns `true` if the actor lost this right personally, as opposed to never having it.
    pub fn caused_by_explicit_removal(&self) -> bool {
        self.reason == DenialReason::ExplicitlyRemoved
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Decorates a base authorization service with a permission adjuster.
#[derive(Debug)]
pub struct Authorizer<B, A> {
    base: B,
    adjuster: A,
}

impl<B, A> Authorizer<B, A>
where
    B: BasePermissions,
    A: PermissionAdjuster,
{
    pub fn new(base: B, adjuster: A) -> Self {
        Self { base, adjuster }
    }

    pub fn adjuster(&self) -> &A {
        &self.adjuster
    }

    /// Returns the effective permissions of an actor on a subject.
    pub async fn permissions(
        &self,
        session: &mut Session,
        subject: &Subject,
        actor: &Actor,
    ) -> Result<MergedPermissions, AuthorizationError<B::Error>> {
        let base = self
            .base
            .base_permissions(actor, subject)
            .await
            .map_err(AuthorizationError::Base)?;
        let merged = self.adjuster.adjust(session, &base, subject, actor).await?;
        Ok(merged)
    }

    /// Decides if an actor may use a right on a subject.
    ///
    /// Failing to resolve overrides denies access instead of falling back to the base
    /// permissions. Only failures of the base service itself are returned as errors.
    pub async fn check_access(
        &self,
        session: &mut Session,
        right: &RightName,
        subject: &Subject,
        actor: &Actor,
    ) -> Result<Decision, AuthorizationError<B::Error>> {
        let reason = match self.permissions(session, subject, actor).await {
            Ok(merged) if merged.contains(right) => return Ok(Decision::Allowed),
            Ok(merged) if merged.lost(right) => DenialReason::ExplicitlyRemoved,
            Ok(_) => DenialReason::NotGranted,
            Err(AuthorizationError::Overrides(err)) => {
                warn!(%subject, %right, "denying access, overrides unavailable: {err}");
                DenialReason::OverridesUnavailable
            }
            Err(err) => return Err(err),
        };

        Ok(Decision::Denied(Denial {
            right: right.clone(),
            reason,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::convert::Infallible;

    use userprotect_core::{PageId, RightName, Subject, UserId};

    use crate::directory::Actor;
    use crate::error::OverrideError;
    use crate::merge::MergedPermissions;
    use crate::session::Session;

    use super::{Authorizer, BasePermissions, Decision, DenialReason, PermissionAdjuster};

    fn right(value: &str) -> RightName {
        value.parse().unwrap()
    }

    struct Groups;

    impl BasePermissions for Groups {
        type Error = Infallible;

        async fn base_permissions(
            &self,
            actor: &Actor,
            _subject: &Subject,
        ) -> Result<BTreeSet<RightName>, Self::Error> {
            Ok(match actor {
                Actor::Anonymous => BTreeSet::from([right("read")]),
                Actor::User(_) => BTreeSet::from([right("read"), right("edit")]),
            })
        }
    }

    /// Takes away "edit" from everyone.
    struct RemoveEdit;

    impl PermissionAdjuster for RemoveEdit {
        async fn adjust(
            &self,
            _session: &mut Session,
            base: &BTreeSet<RightName>,
            _subject: &Subject,
            _actor: &Actor,
        ) -> Result<MergedPermissions, OverrideError> {
            let mut merged = MergedPermissions::unchanged(base);
            if merged.effective.remove(&right("edit")) {
                merged.explicitly_lost.insert(right("edit"));
            }
            Ok(merged)
        }
    }

    #[tokio::test]
    async fn denial_reasons() {
        let authorizer = Authorizer::new(Groups, RemoveEdit);
        let subject = Subject::page(PageId::new(1).unwrap());
        let actor = Actor::User(UserId::new(1));
        let mut session = Session::new();

        let decision = authorizer
            .check_access(&mut session, &right("read"), &subject, &actor)
            .await
            .unwrap();
        assert!(decision.is_allowed());

        let Decision::Denied(denial) = authorizer
            .check_access(&mut session, &right("edit"), &subject, &actor)
            .await
            .unwrap()
        else {
            panic!("expected denial");
        };
        assert_eq!(denial.reason, DenialReason::ExplicitlyRemoved);
        assert!(denial.caused_by_explicit_removal());

        let Decision::Denied(denial) = authorizer
            .check_access(&mut session, &right("delete"), &subject, &actor)
            .await
            .unwrap()
        else {
            panic!("expected denial");
        };
        assert_eq!(denial.reason, DenialReason::NotGranted);
        assert!(!denial.caused_by_explicit_removal());
    }
}

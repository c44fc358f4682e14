// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeSet;
use std::error::Error;

use tracing::{debug, trace, warn};
use userprotect_core::{OverrideRow, PageId, RightName, Subject, Timestamp, UserId, UserName};
use userprotect_store::{OverrideStore, Transaction};

use crate::directory::{Actor, UserDirectory};
use crate::error::OverrideError;
use crate::merge::{MergedPermissions, merge};
use crate::overrides::OverrideSet;
use crate::registry::TypeRegistry;
use crate::resolver::{ResolvedOverride, accumulate};
use crate::session::Session;

/// Result of replacing the overrides of a subject.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Number of previously stored rows which were removed.
    pub deleted: u64,

    /// Number of newly stored rows.
    pub inserted: u64,

    /// Submitted user names without an account. These were skipped.
    pub unresolved: BTreeSet<UserName>,
}

/// Resolves, merges and stores per-user permission overrides.
///
/// Resolutions are cached in the `Session` passed into every call, the manager itself holds no
/// per-request state and can be shared between requests.
///
/// All writes replace the complete override set of one subject inside a single store transaction:
///
/// ```text
/// begin --> delete all rows of subject --> insert new rows --> commit
///                     |                           |
///                     +------- on error ----------+--> rollback
/// ```
///
/// Readers never observe the state between delete and insert. Dropping a save before it finished,
/// for example when the request gets cancelled, leaves the stored overrides untouched.
///
/// Both stores hold one transaction at a time. Saves and lifecycle cleanups therefore wait for
/// each other even when they concern different subjects, resolutions do not wait for them.
#[derive(Debug)]
pub struct Manager<S, D> {
    store: S,
    directory: D,
    registry: TypeRegistry,
}

impl<S, D> Manager<S, D> {
    pub fn new(store: S, directory: D, registry: TypeRegistry) -> Self {
        Self {
            store,
            directory,
            registry,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}

impl<S, D, E> Manager<S, D>
where
    S: OverrideStore<Error = E> + Transaction<Error = E>,
    E: Error + Send + Sync + 'static,
    D: UserDirectory,
{
    /// Returns the net added and removed rights of a user on a subject.
    ///
    /// Wildcard overrides are expanded into the rights which are applicable right now, not the
    /// ones which were applicable when the override was stored.
    pub async fn resolve(
        &self,
        session: &mut Session,
        subject: &Subject,
        user_id: UserId,
    ) -> Result<ResolvedOverride, OverrideError> {
        if let Some(resolved) = session.get(subject, user_id) {
            trace!(%subject, user = %user_id, "resolved overrides from session");
            return Ok(resolved.clone());
        }

        let exists = subject.exists();
        let rows = self
            .store
            .overrides_for_user(subject, user_id, &self.registry.query_types(exists))
            .await
            .map_err(OverrideError::storage)?;
        let resolved = accumulate(&rows, self.registry.applicable_types(exists));

        debug!(%subject, user = %user_id, rows = rows.len(), "resolved overrides");
        session.insert(subject, user_id, resolved.clone());

        Ok(resolved)
    }

    /// Applies the overrides of an actor to their base permissions on a subject.
    ///
    /// Anonymous actors are never affected by overrides.
    pub async fn merge(
        &self,
        session: &mut Session,
        base: &BTreeSet<RightName>,
        subject: &Subject,
        actor: &Actor,
    ) -> Result<MergedPermissions, OverrideError> {
        let Actor::User(user_id) = actor else {
            return Ok(MergedPermissions::unchanged(base));
        };

        let resolved = self.resolve(session, subject, *user_id).await?;
        Ok(merge(base, &resolved))
    }

    /// Replaces all overrides of a subject with the submitted ones.
    ///
    /// Callers need to make sure the acting user is allowed to manage overrides on this subject.
    /// Conflicting buckets are normalized first, buckets of rights which do not apply to the
    /// subject are ignored and names without an account are skipped. Submitting an empty set
    /// clears all overrides of the subject.
    pub async fn save(
        &self,
        session: &mut Session,
        subject: &Subject,
        overrides: &OverrideSet,
    ) -> Result<SaveOutcome, OverrideError> {
        let normalized = overrides.normalize(self.registry.applicable_types(subject.exists()));

        let names = normalized.user_names();
        let user_ids = self
            .directory
            .resolve_user_ids(&names)
            .await
            .map_err(OverrideError::directory)?;
        let unresolved: BTreeSet<UserName> = names
            .into_iter()
            .filter(|name| !user_ids.contains_key(name))
            .collect();

        let timestamp = Timestamp::now();
        let mut seen = BTreeSet::new();
        let mut rows = Vec::new();
        for (direction, right_type, names) in normalized.iter() {
            for name in names {
                let Some(user_id) = user_ids.get(name) else {
                    continue;
                };

                // Two names can belong to the same account.
                if seen.insert((direction, right_type.clone(), *user_id)) {
                    rows.push(OverrideRow::new(
                        subject.clone(),
                        right_type.clone(),
                        *user_id,
                        direction,
                        timestamp,
                    ));
                }
            }
        }

        let (deleted, inserted) = self.replace(subject, &rows).await?;
        session.invalidate_subject(subject);

        debug!(
            %subject,
            deleted,
            inserted,
            unresolved = unresolved.len(),
            "saved overrides"
        );

        Ok(SaveOutcome {
            deleted,
            inserted,
            unresolved,
        })
    }

    /// Returns the stored overrides of a subject by user name.
    ///
    /// Only rights applicable to the subject and the wildcard are listed. Overrides of accounts
    /// which do not exist anymore are left out.
    pub async fn current_overrides(&self, subject: &Subject) -> Result<OverrideSet, OverrideError> {
        let rows = self
            .store
            .overrides_for_subject(subject, &self.registry.query_types(subject.exists()))
            .await
            .map_err(OverrideError::storage)?;

        let user_ids: BTreeSet<UserId> = rows.iter().map(|row| row.user_id).collect();
        let names = self
            .directory
            .user_names(&user_ids)
            .await
            .map_err(OverrideError::directory)?;

        let mut overrides = OverrideSet::new();
        for row in rows {
            if let Some(name) = names.get(&row.user_id) {
                overrides.insert(row.direction, row.right_type, name.clone());
            }
        }

        Ok(overrides)
    }

    /// Drops all overrides of a deleted page.
    pub async fn page_deleted(
        &self,
        session: &mut Session,
        id: PageId,
    ) -> Result<u64, OverrideError> {
        let subject = Subject::page(id);
        let (deleted, _) = self.replace(&subject, &[]).await?;
        session.invalidate_subject(&subject);

        debug!(%subject, deleted, "dropped overrides of deleted page");
        Ok(deleted)
    }

    /// Drops all overrides of a pending title after a page was created under it.
    ///
    /// Overrides of the title are not carried over to the new page.
    pub async fn page_created(
        &self,
        session: &mut Session,
        namespace: i32,
        title: &str,
    ) -> Result<u64, OverrideError> {
        let subject = Subject::pending_title(namespace, title)?;
        let (deleted, _) = self.replace(&subject, &[]).await?;
        session.invalidate_subject(&subject);

        debug!(%subject, deleted, "dropped overrides of created title");
        Ok(deleted)
    }

    /// Deletes all rows of a subject and inserts the given ones in one transaction.
    ///
    /// Returns the number of deleted and inserted rows.
    async fn replace(
        &self,
        subject: &Subject,
        rows: &[OverrideRow],
    ) -> Result<(u64, u64), OverrideError> {
        let permit = self.store.begin().await.map_err(OverrideError::storage)?;

        let result = async {
            let deleted = self.store.delete_overrides(subject).await?;
            let inserted = self.store.insert_overrides(rows).await?;
            Ok::<_, E>((deleted, inserted))
        }
        .await;

        match result {
            Ok(counts) => {
                self.store
                    .commit(permit)
                    .await
                    .map_err(OverrideError::storage)?;
                Ok(counts)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(permit).await {
                    warn!(%subject, "rolling back override transaction failed: {rollback_err}");
                }
                Err(OverrideError::storage(err))
            }
        }
    }
}
